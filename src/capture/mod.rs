//! Camera hardware and capture session.
//!
//! This module provides the device abstraction, the capture session that
//! binds one device input to a still-image output, and a mock backend for
//! testing. A webcam backend built on `nokhwa` is available with the
//! `camera` feature.

mod device;
mod mock;
#[cfg(feature = "camera")]
mod native;
mod session;

pub use device::{
    CameraPosition, CaptureBackend, CaptureDevice, ConfigurationLock, DeviceError, DeviceHandle,
    FlashMode, FocusMode, FocusPoint,
};
pub use mock::{MockBackend, MockCapture, MockDevice, StallHandle};
#[cfg(feature = "camera")]
pub use native::{NativeBackend, NativeDevice};
pub use session::{
    CaptureSession, DeviceInput, OutputSettings, SessionId, SessionPreset, StillCodec,
    StillImageConnection, StillImageOutput,
};
