//! External collaborators of the screens: the image viewer and the system
//! image picker.

use std::collections::VecDeque;
use std::fmt;

use image::DynamicImage;

use crate::photo::CapturedImage;

/// Source a system picker presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// The system camera UI.
    Camera,
    /// The user's photo library.
    PhotoLibrary,
}

/// What a picker produced.
#[derive(Clone)]
pub enum PickerResult {
    Picked(DynamicImage),
    Cancelled,
}

impl fmt::Debug for PickerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickerResult::Picked(image) => f
                .debug_tuple("Picked")
                .field(&(image.width(), image.height()))
                .finish(),
            PickerResult::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// One-shot completion handed to a picker.
///
/// Consuming it delivers the result to the screen that presented the
/// picker; it may be completed from any thread.
pub struct PickerReply {
    deliver: Box<dyn FnOnce(PickerResult) + Send>,
}

impl PickerReply {
    pub(crate) fn new(deliver: impl FnOnce(PickerResult) + Send + 'static) -> Self {
        Self {
            deliver: Box::new(deliver),
        }
    }

    pub fn finish(self, result: PickerResult) {
        (self.deliver)(result);
    }

    pub fn picked(self, image: DynamicImage) {
        self.finish(PickerResult::Picked(image));
    }

    pub fn cancelled(self) {
        self.finish(PickerResult::Cancelled);
    }
}

impl fmt::Debug for PickerReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PickerReply")
    }
}

/// System image picker (native camera UI or photo library).
pub trait ImagePicker {
    /// Whether `source` exists and may be used on this device.
    fn is_source_available(&self, source: SourceType) -> bool;

    /// Presents the picker for `source`; `reply` must be completed once.
    fn present(&mut self, source: SourceType, reply: PickerReply);
}

/// Displays an image with a dismiss action.
pub trait ImageViewer {
    fn show(&mut self, image: CapturedImage);

    fn dismiss(&mut self);
}

/// Viewer that records what it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingViewer {
    shown: Vec<CapturedImage>,
    dismissals: usize,
    visible: bool,
}

impl RecordingViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> &[CapturedImage] {
        &self.shown
    }

    pub fn dismissals(&self) -> usize {
        self.dismissals
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl ImageViewer for RecordingViewer {
    fn show(&mut self, image: CapturedImage) {
        tracing::debug!(?image, "Viewer showing image");
        self.shown.push(image);
        self.visible = true;
    }

    fn dismiss(&mut self) {
        if self.visible {
            self.dismissals += 1;
        }
        self.visible = false;
    }
}

/// Picker answering each presentation with the next scripted result.
///
/// Replies are delivered immediately; with an empty script the picker
/// reports a cancellation.
#[derive(Debug)]
pub struct ScriptedPicker {
    camera_available: bool,
    library_available: bool,
    script: VecDeque<PickerResult>,
    presented: Vec<SourceType>,
}

impl ScriptedPicker {
    pub fn new() -> Self {
        Self {
            camera_available: true,
            library_available: true,
            script: VecDeque::new(),
            presented: Vec::new(),
        }
    }

    /// A device without any camera hardware.
    pub fn without_camera(mut self) -> Self {
        self.camera_available = false;
        self
    }

    pub fn then(mut self, result: PickerResult) -> Self {
        self.script.push_back(result);
        self
    }

    pub fn presented(&self) -> &[SourceType] {
        &self.presented
    }
}

impl Default for ScriptedPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ImagePicker for ScriptedPicker {
    fn is_source_available(&self, source: SourceType) -> bool {
        match source {
            SourceType::Camera => self.camera_available,
            SourceType::PhotoLibrary => self.library_available,
        }
    }

    fn present(&mut self, source: SourceType, reply: PickerReply) {
        self.presented.push(source);
        let result = self.script.pop_front().unwrap_or(PickerResult::Cancelled);
        reply.finish(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::ImageOrientation;
    use crate::photo::ImageSource;
    use std::sync::mpsc;

    #[test]
    fn test_scripted_picker_replies_in_order() {
        let mut picker = ScriptedPicker::new().then(PickerResult::Picked(DynamicImage::new_rgb8(4, 4)));
        let (tx, rx) = mpsc::channel();

        let first = tx.clone();
        picker.present(SourceType::PhotoLibrary, PickerReply::new(move |r| first.send(r).unwrap()));
        picker.present(SourceType::Camera, PickerReply::new(move |r| tx.send(r).unwrap()));

        assert!(matches!(rx.recv().unwrap(), PickerResult::Picked(_)));
        assert!(matches!(rx.recv().unwrap(), PickerResult::Cancelled));
        assert_eq!(picker.presented(), &[SourceType::PhotoLibrary, SourceType::Camera]);
    }

    #[test]
    fn test_recording_viewer_dismiss() {
        let mut viewer = RecordingViewer::new();
        viewer.dismiss();
        assert_eq!(viewer.dismissals(), 0);

        viewer.show(CapturedImage::new(
            DynamicImage::new_rgb8(2, 2),
            ImageOrientation::Up,
            ImageSource::PhotoLibrary,
        ));
        assert!(viewer.is_visible());
        viewer.dismiss();
        assert_eq!(viewer.dismissals(), 1);
        assert_eq!(viewer.shown().len(), 1);
    }
}
