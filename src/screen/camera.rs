//! The custom camera screen.
//!
//! [`CameraScreen`] is owned by the UI thread. It owns the single capture
//! session (through a slot shared with the work queue), the flash mode and
//! the control state. Hardware work runs on the serial [`WorkQueue`];
//! still captures run on a short-lived capture thread. Both report back
//! through a channel that the UI thread drains with
//! [`CameraScreen::process_pending`] or [`CameraScreen::wait_for_message`].

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use super::collaborators::{ImagePicker, ImageViewer, PickerReply, PickerResult, SourceType};
use super::controls::ControlState;
use super::preview::{PreviewLayer, Rect};
use super::tasks::{self, lock_slot, SessionError, SessionSlot, SetupReport, SwitchReport};
use crate::capture::{
    CameraPosition, CaptureBackend, CaptureSession, FlashMode, SessionId, SessionPreset,
};
use crate::config::FileConfig;
use crate::orientation::{chrome_rotation, image_orientation, DeviceOrientation, ImageOrientation};
use crate::photo::{CaptureError, CapturedImage, ImageSource};
use crate::worker::{Priority, WorkQueue};

/// Errors surfaced to the user by the screens.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("this device doesn't have a camera")]
    NoCamera,
    #[error("failed to start background worker: {0}")]
    Worker(#[from] io::Error),
}

/// Results posted back to the UI thread.
enum UiMessage {
    SetupFinished {
        session: SessionId,
        result: Result<SetupReport, SessionError>,
    },
    FlashAvailability {
        session: SessionId,
        available: bool,
    },
    SwitchFinished {
        session: SessionId,
        report: SwitchReport,
    },
    FlashApplied {
        session: SessionId,
        result: Result<FlashMode, SessionError>,
    },
    CaptureFinished {
        session: SessionId,
        result: Result<CapturedImage, CaptureError>,
    },
    PickerFinished(PickerResult),
}

/// Read-only view of the session for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub preset: SessionPreset,
    pub inputs: Vec<CameraPosition>,
    pub outputs: usize,
    pub running: bool,
}

impl SessionSnapshot {
    fn of(session: &CaptureSession) -> Self {
        Self {
            id: session.id(),
            preset: session.preset(),
            inputs: session
                .inputs()
                .iter()
                .map(|input| input.device().position())
                .collect(),
            outputs: session.outputs().len(),
            running: session.is_running(),
        }
    }
}

/// Controller of the custom camera screen.
pub struct CameraScreen<V: ImageViewer, P: ImagePicker> {
    backend: Arc<dyn CaptureBackend>,
    config: FileConfig,
    queue: WorkQueue,
    slot: SessionSlot,
    active: Option<SessionId>,
    next_session: u64,
    flash_mode: Option<FlashMode>,
    orientation: DeviceOrientation,
    container: Rect,
    preview: Option<PreviewLayer>,
    controls: ControlState,
    viewer: V,
    picker: P,
    tx: Sender<UiMessage>,
    rx: Receiver<UiMessage>,
}

impl<V: ImageViewer, P: ImagePicker> CameraScreen<V, P> {
    /// Creates the screen with the flash chooser hidden and the controls
    /// rotated for `orientation`.
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        config: FileConfig,
        orientation: DeviceOrientation,
        viewer: V,
        picker: P,
    ) -> Result<Self, ScreenError> {
        let queue = WorkQueue::new(config.worker.thread_name.clone())?;
        let (tx, rx) = mpsc::channel();
        let mut controls = ControlState::new(&config.ui);
        controls.chrome_rotation = chrome_rotation(orientation);

        Ok(Self {
            backend,
            config,
            queue,
            slot: Arc::new(Mutex::new(None)),
            active: None,
            next_session: 1,
            flash_mode: None,
            orientation,
            container: Rect::default(),
            preview: None,
            controls,
            viewer,
            picker,
            tx,
            rx,
        })
    }

    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    /// Flash mode recorded from the device, once known.
    pub fn flash_mode(&self) -> Option<FlashMode> {
        self.flash_mode
    }

    pub fn orientation(&self) -> DeviceOrientation {
        self.orientation
    }

    pub fn preview(&self) -> Option<&PreviewLayer> {
        self.preview.as_ref()
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    pub fn picker(&self) -> &P {
        &self.picker
    }

    /// Whether the screen currently owns a session.
    pub fn has_session(&self) -> bool {
        self.active.is_some()
    }

    pub fn session_snapshot(&self) -> Option<SessionSnapshot> {
        lock_slot(&self.slot).as_ref().map(SessionSnapshot::of)
    }

    /// Screen became visible: bring the capture session up.
    ///
    /// Does nothing if a session already exists.
    pub fn appear(&mut self) {
        if self.active.is_some() {
            return;
        }

        self.controls.flash_button.hidden = true;
        self.controls.camera_button.hidden = true;

        let id = SessionId::new(self.next_session);
        self.next_session += 1;
        *lock_slot(&self.slot) = Some(CaptureSession::new(id, self.config.session.preset));
        self.active = Some(id);

        let slot = Arc::clone(&self.slot);
        let backend = Arc::clone(&self.backend);
        let session_config = self.config.session.clone();
        let tx = self.tx.clone();
        self.queue.submit(Priority::VeryHigh, move |token| {
            let result = tasks::configure_session(&slot, &*backend, id, &session_config, token);
            let _ = tx.send(UiMessage::SetupFinished {
                session: id,
                result,
            });
        });
        tracing::debug!(session = %id, "Capture setup scheduled");
    }

    /// Screen became invisible: tear the session down.
    ///
    /// Safe to call at any point, including before setup finished, and
    /// any number of times.
    pub fn disappear(&mut self) {
        self.queue.cancel_all();
        self.preview = None;
        self.controls.preview_attached = false;
        self.controls.blur_visible = false;
        self.controls.flip_in_progress = false;
        self.controls.camera_button.enabled = true;

        if let Some(mut session) = lock_slot(&self.slot).take() {
            session.remove_all();
            session.stop_running();
            tracing::info!(session = %session.id(), "Capture session released");
        }
        self.active = None;
    }

    /// Container bounds changed; the preview follows them.
    pub fn layout(&mut self, bounds: Rect) {
        self.container = bounds;
        if let Some(preview) = self.preview.as_mut() {
            preview.set_frame(bounds);
        }
    }

    pub fn orientation_changed(&mut self, orientation: DeviceOrientation) {
        self.orientation = orientation;
        self.controls.chrome_rotation = chrome_rotation(orientation);
    }

    /// The always-visible flash button: shows or hides the mode chooser.
    pub fn flash_button_pressed(&mut self) {
        self.controls.toggle_flash_chooser();
    }

    /// One of the three chooser options was picked.
    ///
    /// The mode is applied to the device in the background; the selection
    /// and icon only change once the device accepted it.
    pub fn select_flash_mode(&mut self, mode: FlashMode) {
        if let Some(id) = self.active {
            let slot = Arc::clone(&self.slot);
            let tx = self.tx.clone();
            self.queue.submit(Priority::High, move |_| {
                let result = tasks::apply_flash_mode(&slot, id, mode);
                let _ = tx.send(UiMessage::FlashApplied {
                    session: id,
                    result,
                });
            });
        }
        self.controls.toggle_flash_chooser();
    }

    /// Starts a camera switch: stops the session, covers the preview with
    /// the blur overlay and starts the flip transition. Ignored while the
    /// switch button is hidden or disabled.
    ///
    /// The presentation layer calls [`Self::flip_transition_finished`] when
    /// the transition has visually completed.
    pub fn switch_camera_pressed(&mut self) {
        if self.active.is_none() || !self.controls.camera_button.is_usable() {
            return;
        }

        if let Some(session) = lock_slot(&self.slot).as_mut() {
            session.stop_running();
        }
        self.controls.camera_button.enabled = false;
        self.controls.blur_visible = true;
        self.controls.flip_in_progress = true;
    }

    pub fn flip_transition_finished(&mut self) {
        if !self.controls.flip_in_progress {
            return;
        }
        self.controls.flip_in_progress = false;
        self.controls.camera_button.enabled = true;

        let Some(id) = self.active else {
            return;
        };
        let slot = Arc::clone(&self.slot);
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.queue.submit(Priority::VeryHigh, move |token| {
            let flash_tx = tx.clone();
            let report = tasks::switch_input(&slot, &*backend, id, token, |available| {
                let _ = flash_tx.send(UiMessage::FlashAvailability {
                    session: id,
                    available,
                });
            });
            let _ = tx.send(UiMessage::SwitchFinished {
                session: id,
                report,
            });
        });
    }

    /// Shutter pressed: capture one still frame.
    ///
    /// Ignored while the shutter is disabled or hidden behind the flash
    /// chooser.
    pub fn take_photo(&mut self) {
        if !self.controls.shutter.is_usable() || !self.controls.shutter_visible {
            return;
        }
        let Some(id) = self.active else {
            return;
        };
        let Some(connection) = lock_slot(&self.slot)
            .as_ref()
            .and_then(CaptureSession::still_image_connection)
        else {
            tracing::debug!(session = %id, "No still image connection, shutter ignored");
            return;
        };

        self.controls.shutter.enabled = false;
        let orientation = image_orientation(self.orientation, connection.position());
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name("still-capture".to_string())
            .spawn(move || {
                let result = connection
                    .capture()
                    .map_err(CaptureError::from)
                    .and_then(|bytes| CapturedImage::decode_jpeg(&bytes, orientation));
                let _ = tx.send(UiMessage::CaptureFinished {
                    session: id,
                    result,
                });
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Failed to start still capture");
            self.controls.shutter.enabled = true;
        }
    }

    /// Presents the photo library picker.
    pub fn open_photo_library(&mut self) {
        let tx = self.tx.clone();
        let reply = PickerReply::new(move |result| {
            let _ = tx.send(UiMessage::PickerFinished(result));
        });
        self.picker.present(SourceType::PhotoLibrary, reply);
    }

    /// The viewer's done action.
    pub fn viewer_done(&mut self) {
        self.viewer.dismiss();
    }

    /// Handles every message already posted. Returns how many were handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for one message and handles it.
    pub fn wait_for_message(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => {
                self.handle(message);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn is_current(&self, session: SessionId) -> bool {
        self.active == Some(session)
    }

    fn handle(&mut self, message: UiMessage) {
        match message {
            UiMessage::SetupFinished { session, result } => {
                if !self.is_current(session) {
                    tracing::debug!(%session, "Ignoring setup result for released session");
                    return;
                }
                match result {
                    Ok(report) => self.session_ready(session, report),
                    Err(e) => tracing::debug!(%session, error = %e, "Capture setup aborted"),
                }
            }
            UiMessage::FlashAvailability { session, available } => {
                if self.is_current(session) {
                    self.controls.flash_button.hidden = !available;
                }
            }
            UiMessage::SwitchFinished { session, report } => {
                if !self.is_current(session) {
                    return;
                }
                if let Err(e) = &report.result {
                    tracing::debug!(%session, error = %e, "Camera switch failed");
                }
                if let Some(session) = lock_slot(&self.slot).as_mut() {
                    session.start_running();
                }
                self.controls.flash_button.hidden = !report.flash_available;
                self.controls.blur_visible = false;
            }
            UiMessage::FlashApplied { session, result } => {
                if !self.is_current(session) {
                    return;
                }
                match result {
                    Ok(mode) => self.set_flash_mode(mode),
                    Err(e) => tracing::debug!(%session, error = %e, "Flash mode change dropped"),
                }
            }
            UiMessage::CaptureFinished { session, result } => {
                self.controls.shutter.enabled = true;
                match result {
                    Ok(image) if self.is_current(session) => {
                        tracing::info!(
                            %session,
                            orientation = ?image.orientation(),
                            "Photo captured"
                        );
                        self.viewer.show(image);
                    }
                    Ok(_) => tracing::debug!(%session, "Photo dropped, screen dismissed"),
                    Err(e) => tracing::debug!(%session, error = %e, "Still capture dropped"),
                }
            }
            UiMessage::PickerFinished(PickerResult::Picked(image)) => {
                self.viewer.show(CapturedImage::new(
                    image,
                    ImageOrientation::Up,
                    ImageSource::PhotoLibrary,
                ));
            }
            UiMessage::PickerFinished(PickerResult::Cancelled) => {}
        }
    }

    fn session_ready(&mut self, session: SessionId, report: SetupReport) {
        let mut preview = report.preview;
        preview.set_frame(self.container);
        self.preview = Some(preview);
        self.controls.preview_attached = true;

        if let Some(session) = lock_slot(&self.slot).as_mut() {
            session.start_running();
        }

        self.set_flash_mode(report.flash_mode);
        if report.has_flash {
            self.controls.flash_button.hidden = false;
        }
        if report.both_cameras {
            self.controls.camera_button.hidden = false;
        }
        tracing::info!(%session, "Camera ready");
    }

    fn set_flash_mode(&mut self, mode: FlashMode) {
        self.flash_mode = Some(mode);
        self.controls.show_flash_mode(mode);
    }
}

impl<V: ImageViewer, P: ImagePicker> Drop for CameraScreen<V, P> {
    fn drop(&mut self) {
        self.disappear();
    }
}
