//! Webcam backend built on `nokhwa`.
//!
//! Webcams have no flash and no physical facing, so the configured default
//! device is reported as the back camera and every other device as a front
//! camera. Each still capture opens the stream, grabs one frame and closes
//! it again, which keeps the device handle `Send + Sync`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use super::device::{
    CameraPosition, CaptureBackend, CaptureDevice, DeviceError, DeviceHandle, FlashMode,
    FocusMode, FocusPoint,
};
use super::session::{OutputSettings, StillCodec};

/// One webcam discovered through `nokhwa`.
#[derive(Debug)]
pub struct NativeDevice {
    id: String,
    name: String,
    index: u32,
    position: CameraPosition,
    locked: AtomicBool,
    focus: Mutex<(FocusMode, FocusPoint)>,
}

impl NativeDevice {
    fn new(index: u32, name: String, position: CameraPosition) -> Self {
        Self {
            id: format!("nokhwa-{}", index),
            name,
            index,
            position,
            locked: AtomicBool::new(false),
            focus: Mutex::new((FocusMode::ContinuousAutoFocus, FocusPoint::CENTER)),
        }
    }

    fn grab_frame(&self) -> Result<RgbImage, DeviceError> {
        let format =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut camera = Camera::new(CameraIndex::Index(self.index), format)
            .map_err(|e| DeviceError::CaptureFailed(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| DeviceError::CaptureFailed(e.to_string()))?;
        let frame = camera
            .frame()
            .map_err(|e| DeviceError::CaptureFailed(e.to_string()));
        if let Err(e) = camera.stop_stream() {
            tracing::warn!(device = %self.id, error = %e, "Failed to stop webcam stream");
        }

        let decoded = frame?
            .decode_image::<RgbFormat>()
            .map_err(|e| DeviceError::CaptureFailed(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| DeviceError::CaptureFailed("frame buffer size mismatch".into()))
    }
}

impl CaptureDevice for NativeDevice {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> CameraPosition {
        self.position
    }

    fn open_input(&self) -> Result<(), DeviceError> {
        let format =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        Camera::new(CameraIndex::Index(self.index), format)
            .map(|_| ())
            .map_err(|e| DeviceError::InputUnavailable(e.to_string()))
    }

    fn lock_for_configuration(&self) -> Result<(), DeviceError> {
        if self.locked.swap(true, Ordering::SeqCst) {
            return Err(DeviceError::LockFailed(format!("{} already locked", self.id)));
        }
        Ok(())
    }

    fn unlock_for_configuration(&self) {
        self.locked.store(false, Ordering::SeqCst);
    }

    fn is_focus_mode_supported(&self, _mode: FocusMode) -> bool {
        true
    }

    fn set_focus(&self, mode: FocusMode, point: FocusPoint) -> Result<(), DeviceError> {
        if !self.locked.load(Ordering::SeqCst) {
            return Err(DeviceError::NotLocked);
        }
        *self.focus.lock().unwrap_or_else(PoisonError::into_inner) = (mode, point);
        Ok(())
    }

    fn has_flash(&self) -> bool {
        false
    }

    fn is_flash_available(&self) -> bool {
        false
    }

    fn is_flash_mode_supported(&self, mode: FlashMode) -> bool {
        mode == FlashMode::Off
    }

    fn flash_mode(&self) -> FlashMode {
        FlashMode::Off
    }

    fn set_flash_mode(&self, mode: FlashMode) -> Result<(), DeviceError> {
        if !self.locked.load(Ordering::SeqCst) {
            return Err(DeviceError::NotLocked);
        }
        if mode != FlashMode::Off {
            return Err(DeviceError::Unsupported(format!("flash mode {}", mode)));
        }
        Ok(())
    }

    fn capture_still(&self, settings: &OutputSettings) -> Result<Vec<u8>, DeviceError> {
        let frame = self.grab_frame()?;
        let mut encoded = Vec::new();
        match settings.codec {
            StillCodec::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut encoded, settings.quality);
                DynamicImage::ImageRgb8(frame)
                    .write_with_encoder(encoder)
                    .map_err(|e| DeviceError::CaptureFailed(e.to_string()))?;
            }
        }
        tracing::debug!(device = %self.id, bytes = encoded.len(), "Webcam still captured");
        Ok(encoded)
    }
}

/// Webcam discovery through `nokhwa`.
#[derive(Debug)]
pub struct NativeBackend {
    devices: Vec<Arc<NativeDevice>>,
}

impl NativeBackend {
    /// Queries the system for webcams.
    ///
    /// `default_device` is the index reported as the back camera.
    pub fn discover(default_device: u32) -> Result<Self, DeviceError> {
        let cameras = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| DeviceError::NotFound(e.to_string()))?;

        let devices = cameras
            .into_iter()
            .filter_map(|info| match info.index() {
                CameraIndex::Index(index) => Some((*index, info.human_name())),
                CameraIndex::String(_) => None,
            })
            .map(|(index, name)| {
                let position = if index == default_device {
                    CameraPosition::Back
                } else {
                    CameraPosition::Front
                };
                Arc::new(NativeDevice::new(index, name, position))
            })
            .collect::<Vec<_>>();

        tracing::info!(count = devices.len(), "Webcams discovered");
        Ok(Self { devices })
    }
}

impl CaptureBackend for NativeBackend {
    fn default_video_device(&self) -> Option<DeviceHandle> {
        self.devices
            .iter()
            .find(|device| device.position == CameraPosition::Back)
            .map(|device| Arc::clone(device) as DeviceHandle)
    }

    fn video_devices(&self) -> Vec<DeviceHandle> {
        self.devices
            .iter()
            .map(|device| Arc::clone(device) as DeviceHandle)
            .collect()
    }
}
