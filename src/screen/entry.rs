//! Entry screen: choose between the system camera and the custom camera.

use std::sync::mpsc::{self, Receiver, Sender};

use super::camera::ScreenError;
use super::collaborators::{ImagePicker, ImageViewer, PickerReply, PickerResult, SourceType};
use crate::orientation::ImageOrientation;
use crate::photo::{CapturedImage, ImageSource};

/// A dismissible message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn no_camera() -> Self {
        Self {
            title: "Error".to_string(),
            message: "Your device doesn't have a camera".to_string(),
        }
    }
}

/// Controller of the entry screen.
///
/// Choosing the custom camera only validates that a camera exists; the
/// caller then creates and presents a [`CameraScreen`](super::CameraScreen).
pub struct EntryScreen<P: ImagePicker, V: ImageViewer> {
    picker: P,
    viewer: V,
    alert: Option<Alert>,
    tx: Sender<PickerResult>,
    rx: Receiver<PickerResult>,
}

impl<P: ImagePicker, V: ImageViewer> EntryScreen<P, V> {
    pub fn new(picker: P, viewer: V) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            picker,
            viewer,
            alert: None,
            tx,
            rx,
        }
    }

    /// Presents the system camera picker.
    pub fn show_native_camera(&mut self) -> Result<(), ScreenError> {
        self.require_camera()?;
        let tx = self.tx.clone();
        let reply = PickerReply::new(move |result| {
            let _ = tx.send(result);
        });
        self.picker.present(SourceType::Camera, reply);
        Ok(())
    }

    /// Checks that the custom camera can be shown.
    pub fn show_custom_camera(&mut self) -> Result<(), ScreenError> {
        self.require_camera()
    }

    /// The alert currently shown, if any.
    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Forwards finished picker results to the viewer.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(result) = self.rx.try_recv() {
            handled += 1;
            match result {
                PickerResult::Picked(image) => {
                    tracing::info!("Image taken with the system camera");
                    self.viewer.show(CapturedImage::new(
                        image,
                        ImageOrientation::Up,
                        ImageSource::SystemCamera,
                    ));
                }
                PickerResult::Cancelled => tracing::debug!("System camera cancelled"),
            }
        }
        handled
    }

    /// The viewer's done action.
    pub fn viewer_done(&mut self) {
        self.viewer.dismiss();
    }

    pub fn picker(&self) -> &P {
        &self.picker
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    fn require_camera(&mut self) -> Result<(), ScreenError> {
        if self.picker.is_source_available(SourceType::Camera) {
            return Ok(());
        }
        tracing::warn!("No camera available");
        self.alert = Some(Alert::no_camera());
        Err(ScreenError::NoCamera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{RecordingViewer, ScriptedPicker};
    use image::DynamicImage;

    #[test]
    fn test_no_camera_shows_alert() {
        let picker = ScriptedPicker::new().without_camera();
        let mut screen = EntryScreen::new(picker, RecordingViewer::new());

        assert!(matches!(screen.show_native_camera(), Err(ScreenError::NoCamera)));
        assert_eq!(screen.alert(), Some(&Alert::no_camera()));
        assert!(screen.picker().presented().is_empty());

        screen.dismiss_alert();
        assert!(screen.alert().is_none());

        assert!(matches!(screen.show_custom_camera(), Err(ScreenError::NoCamera)));
        assert!(screen.alert().is_some());
    }

    #[test]
    fn test_native_camera_result_reaches_viewer() {
        let picker = ScriptedPicker::new().then(PickerResult::Picked(DynamicImage::new_rgb8(3, 2)));
        let mut screen = EntryScreen::new(picker, RecordingViewer::new());

        screen.show_native_camera().unwrap();
        assert_eq!(screen.process_pending(), 1);

        let shown = screen.viewer().shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].source(), ImageSource::SystemCamera);
        assert_eq!(shown[0].dimensions(), (3, 2));

        screen.viewer_done();
        assert!(!screen.viewer().is_visible());
    }

    #[test]
    fn test_cancelled_native_camera_shows_nothing() {
        let mut screen = EntryScreen::new(ScriptedPicker::new(), RecordingViewer::new());
        screen.show_native_camera().unwrap();
        assert_eq!(screen.process_pending(), 1);
        assert!(screen.viewer().shown().is_empty());
        assert!(screen.show_custom_camera().is_ok());
        assert!(screen.alert().is_none());
    }
}
