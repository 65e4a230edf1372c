//! Custom Camera Library
//!
//! The logic behind a photo capture screen: a capture session brought up
//! and torn down asynchronously, flash mode selection, front/back camera
//! switching, device-orientation-aware image tagging, and hand-off of the
//! captured photo to a viewer.
//!
//! # Architecture
//!
//! ```text
//! EntryScreen ──▶ CameraScreen ──▶ ImageViewer
//!                   │      ▲
//!        submit     ▼      │  UiMessage
//!                 WorkQueue ──▶ CaptureSession ──▶ CaptureDevice
//! ```
//!
//! The screens live on the UI thread. Hardware reconfiguration runs on a
//! single serial work queue and reports back through messages the UI thread
//! drains, so a slow device never blocks the UI.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use custom_camera::{
//!     capture::MockBackend,
//!     config::FileConfig,
//!     orientation::DeviceOrientation,
//!     screen::{CameraScreen, RecordingViewer, ScriptedPicker},
//! };
//!
//! let mut screen = CameraScreen::new(
//!     Arc::new(MockBackend::phone()),
//!     FileConfig::default(),
//!     DeviceOrientation::Portrait,
//!     RecordingViewer::new(),
//!     ScriptedPicker::new(),
//! )
//! .unwrap();
//!
//! screen.appear();
//! while !screen.controls().preview_attached {
//!     screen.wait_for_message(Duration::from_millis(100));
//! }
//!
//! screen.take_photo();
//! while !screen.controls().shutter.enabled {
//!     screen.wait_for_message(Duration::from_millis(100));
//! }
//! assert_eq!(screen.viewer().shown().len(), 1);
//!
//! screen.disappear();
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod orientation;
pub mod photo;
pub mod screen;
pub mod worker;

// Re-export commonly used types at crate root
pub use capture::{CameraPosition, CaptureBackend, CaptureDevice, FlashMode, MockBackend};
pub use config::FileConfig;
pub use orientation::{DeviceOrientation, ImageOrientation};
pub use photo::{CaptureError, CapturedImage};
pub use screen::{CameraScreen, EntryScreen, ImagePicker, ImageViewer, ScreenError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
