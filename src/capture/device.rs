//! Camera device abstraction.
//!
//! Hardware cameras are reached only through the [`CaptureDevice`] and
//! [`CaptureBackend`] traits, so the session logic can run against real
//! hardware or the mock implementations used for testing.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::session::OutputSettings;

/// Errors that can occur during device operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("camera device not found: {0}")]
    NotFound(String),
    #[error("failed to create device input: {0}")]
    InputUnavailable(String),
    #[error("failed to lock device for configuration: {0}")]
    LockFailed(String),
    #[error("device is not locked for configuration")]
    NotLocked,
    #[error("unsupported device setting: {0}")]
    Unsupported(String),
    #[error("failed to capture still image: {0}")]
    CaptureFailed(String),
}

/// Physical side of the device a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    Front,
    Back,
}

impl CameraPosition {
    /// The camera on the other side of the device.
    pub fn opposite(self) -> Self {
        match self {
            CameraPosition::Front => CameraPosition::Back,
            CameraPosition::Back => CameraPosition::Front,
        }
    }
}

impl fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraPosition::Front => f.write_str("front"),
            CameraPosition::Back => f.write_str("back"),
        }
    }
}

/// Flash behaviour applied when a still image is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    #[default]
    Auto,
    On,
    Off,
}

impl FlashMode {
    /// All modes in chooser order.
    pub const ALL: [FlashMode; 3] = [FlashMode::Auto, FlashMode::On, FlashMode::Off];

    /// Asset name of the icon shown on the flash button for this mode.
    pub fn icon_name(self) -> &'static str {
        match self {
            FlashMode::Auto => "ic_flash_auto_white",
            FlashMode::On => "ic_flash_on_white",
            FlashMode::Off => "ic_flash_off_white",
        }
    }
}

impl fmt::Display for FlashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashMode::Auto => f.write_str("auto"),
            FlashMode::On => f.write_str("on"),
            FlashMode::Off => f.write_str("off"),
        }
    }
}

/// Focus behaviour of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusMode {
    #[default]
    Locked,
    AutoFocus,
    ContinuousAutoFocus,
}

/// Point of interest in normalized frame coordinates (0.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
}

impl FocusPoint {
    /// Centre of the frame.
    pub const CENTER: FocusPoint = FocusPoint { x: 0.5, y: 0.5 };

    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl Default for FocusPoint {
    fn default() -> Self {
        Self::CENTER
    }
}

/// A single camera device.
///
/// Implementations use interior mutability: a device handle is shared
/// between the session, the work queue and the capture thread. Setters
/// must only be called while the device is locked for configuration
/// (see [`ConfigurationLock`]).
pub trait CaptureDevice: fmt::Debug + Send + Sync {
    /// Stable identifier of the device.
    fn unique_id(&self) -> &str;

    /// Human readable device name.
    fn name(&self) -> &str;

    /// Which side of the device the camera faces.
    fn position(&self) -> CameraPosition;

    /// Prepares the device to be attached to a session as an input.
    fn open_input(&self) -> Result<(), DeviceError>;

    /// Takes exclusive configuration access to the device.
    fn lock_for_configuration(&self) -> Result<(), DeviceError>;

    /// Releases configuration access taken by `lock_for_configuration`.
    fn unlock_for_configuration(&self);

    fn is_focus_mode_supported(&self, mode: FocusMode) -> bool;

    /// Sets the focus point of interest and focus mode.
    fn set_focus(&self, mode: FocusMode, point: FocusPoint) -> Result<(), DeviceError>;

    /// Whether the device has flash hardware at all.
    fn has_flash(&self) -> bool;

    /// Whether the flash can currently be used (e.g. not overheated).
    fn is_flash_available(&self) -> bool;

    fn is_flash_mode_supported(&self, mode: FlashMode) -> bool;

    fn flash_mode(&self) -> FlashMode;

    fn set_flash_mode(&self, mode: FlashMode) -> Result<(), DeviceError>;

    /// Captures one still frame encoded according to `settings`.
    fn capture_still(&self, settings: &OutputSettings) -> Result<Vec<u8>, DeviceError>;
}

/// Shared handle to a device.
pub type DeviceHandle = Arc<dyn CaptureDevice>;

/// Discovery of the camera devices available on the system.
pub trait CaptureBackend: Send + Sync {
    /// The system default video device (the back camera when present).
    fn default_video_device(&self) -> Option<DeviceHandle>;

    /// Every available video device.
    fn video_devices(&self) -> Vec<DeviceHandle>;

    /// Whether a camera facing `position` exists.
    fn is_camera_available(&self, position: CameraPosition) -> bool {
        self.video_devices()
            .iter()
            .any(|device| device.position() == position)
    }

    /// Finds the device for `position`.
    ///
    /// The back camera is the system default; the front camera is found by
    /// scanning the available video devices.
    fn device_for(&self, position: CameraPosition) -> Option<DeviceHandle> {
        match position {
            CameraPosition::Back => self.default_video_device(),
            CameraPosition::Front => self
                .video_devices()
                .into_iter()
                .find(|device| device.position() == CameraPosition::Front),
        }
    }
}

/// RAII guard over a device's configuration lock.
///
/// The lock is released when the guard is dropped, including on early
/// returns from a configuration sequence.
pub struct ConfigurationLock<'a> {
    device: &'a dyn CaptureDevice,
}

impl<'a> ConfigurationLock<'a> {
    /// Locks `device` for configuration.
    pub fn acquire(device: &'a dyn CaptureDevice) -> Result<Self, DeviceError> {
        device.lock_for_configuration()?;
        Ok(Self { device })
    }

    /// The locked device.
    pub fn device(&self) -> &dyn CaptureDevice {
        self.device
    }
}

impl Drop for ConfigurationLock<'_> {
    fn drop(&mut self) {
        self.device.unlock_for_configuration();
    }
}

impl fmt::Debug for ConfigurationLock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationLock")
            .field("device", &self.device.unique_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockDevice;

    #[test]
    fn test_opposite_position() {
        assert_eq!(CameraPosition::Back.opposite(), CameraPosition::Front);
        assert_eq!(CameraPosition::Front.opposite(), CameraPosition::Back);
    }

    #[test]
    fn test_flash_icon_names() {
        assert_eq!(FlashMode::Auto.icon_name(), "ic_flash_auto_white");
        assert_eq!(FlashMode::On.icon_name(), "ic_flash_on_white");
        assert_eq!(FlashMode::Off.icon_name(), "ic_flash_off_white");
    }

    #[test]
    fn test_configuration_lock_released_on_drop() {
        let device = MockDevice::back();
        {
            let lock = ConfigurationLock::acquire(&device).unwrap();
            lock.device().set_flash_mode(FlashMode::On).unwrap();
            assert!(device.is_locked());
        }
        assert!(!device.is_locked());
        assert!(matches!(
            device.set_flash_mode(FlashMode::Off),
            Err(DeviceError::NotLocked)
        ));
    }

    #[test]
    fn test_focus_point_bounds() {
        assert!(FocusPoint::CENTER.is_normalized());
        assert!(!FocusPoint { x: 1.5, y: 0.5 }.is_normalized());
    }
}
