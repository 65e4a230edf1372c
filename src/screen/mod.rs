//! The two screens of the app and their collaborators.
//!
//! - [`EntryScreen`] offers the system camera or the custom camera.
//! - [`CameraScreen`] drives the custom camera: session lifecycle, flash,
//!   camera switching, orientation and the shutter.
//!
//! Both are owned by the UI thread and expose their visible state as plain
//! data; drawing it is left to the presentation layer.

mod camera;
mod collaborators;
mod controls;
mod entry;
mod preview;
mod tasks;

pub use camera::{CameraScreen, ScreenError, SessionSnapshot};
pub use collaborators::{
    ImagePicker, ImageViewer, PickerReply, PickerResult, RecordingViewer, ScriptedPicker,
    SourceType,
};
pub use controls::{ButtonState, Control, ControlState};
pub use entry::{Alert, EntryScreen};
pub use preview::{PreviewLayer, Rect};
pub use tasks::SessionError;
