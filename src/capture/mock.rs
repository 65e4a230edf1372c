//! Mock camera hardware for testing.
//!
//! [`MockDevice`] behaves like a real device with respect to configuration
//! locking and flash/focus support, and produces small synthetic JPEG
//! frames. Failures can be injected at construction or at runtime.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};

use super::device::{
    CameraPosition, CaptureBackend, CaptureDevice, DeviceError, DeviceHandle, FlashMode,
    FocusMode, FocusPoint,
};
use super::session::{OutputSettings, StillCodec};

/// What a mock device returns from a still capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockCapture {
    /// A synthetic gradient frame encoded as JPEG.
    #[default]
    Synthetic,
    /// The request fails with a device error.
    Fail,
    /// The request succeeds without data.
    Empty,
}

#[derive(Debug, Default)]
struct StallState {
    released: bool,
    stalled: bool,
}

#[derive(Debug, Default)]
struct Stall {
    state: Mutex<StallState>,
    changed: Condvar,
}

impl Stall {
    fn state(&self) -> MutexGuard<'_, StallState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks the caller until the owning [`StallHandle`] lets go.
    fn pass(&self) {
        let mut state = self.state();
        state.stalled = true;
        self.changed.notify_all();
        while !state.released {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.stalled = false;
    }
}

/// Holds a [`MockDevice`]'s configuration lock requests until released.
///
/// Dropping the handle releases them too.
#[derive(Debug)]
pub struct StallHandle {
    stall: Arc<Stall>,
}

impl StallHandle {
    /// Waits up to `timeout` for a lock request to be held. Returns whether
    /// one is.
    pub fn wait_until_stalled(&self, timeout: Duration) -> bool {
        let state = self.stall.state();
        let (state, _) = self
            .stall
            .changed
            .wait_timeout_while(state, timeout, |state| !state.stalled)
            .unwrap_or_else(PoisonError::into_inner);
        state.stalled
    }

    pub fn release(self) {}
}

impl Drop for StallHandle {
    fn drop(&mut self) {
        self.stall.state().released = true;
        self.stall.changed.notify_all();
    }
}

#[derive(Debug, Default)]
struct MockState {
    locked: bool,
    flash_mode: FlashMode,
    focus_mode: FocusMode,
    focus_point: FocusPoint,
    capture: MockCapture,
}

/// Mock camera device.
#[derive(Debug)]
pub struct MockDevice {
    id: String,
    name: String,
    position: CameraPosition,
    has_flash: bool,
    flash_available: AtomicBool,
    focus_supported: bool,
    fail_input: bool,
    fail_lock: AtomicBool,
    stall: Option<Arc<Stall>>,
    frame_width: u32,
    frame_height: u32,
    state: Mutex<MockState>,
    captures: AtomicUsize,
}

impl MockDevice {
    /// Creates a device facing `position` with flash and autofocus.
    pub fn new(id: impl Into<String>, position: CameraPosition) -> Self {
        let id = id.into();
        Self {
            name: format!("Mock {} camera", position),
            id,
            position,
            has_flash: true,
            flash_available: AtomicBool::new(true),
            focus_supported: true,
            fail_input: false,
            fail_lock: AtomicBool::new(false),
            stall: None,
            frame_width: 64,
            frame_height: 48,
            state: Mutex::new(MockState {
                flash_mode: FlashMode::Off,
                ..MockState::default()
            }),
            captures: AtomicUsize::new(0),
        }
    }

    /// A back camera with flash.
    pub fn back() -> Self {
        Self::new("mock-back", CameraPosition::Back)
    }

    /// A front camera without flash, like most phone selfie cameras.
    pub fn front() -> Self {
        Self::new("mock-front", CameraPosition::Front).without_flash()
    }

    pub fn without_flash(mut self) -> Self {
        self.has_flash = false;
        self.flash_available = AtomicBool::new(false);
        self
    }

    pub fn without_focus(mut self) -> Self {
        self.focus_supported = false;
        self
    }

    /// Input creation for this device fails.
    pub fn with_input_failure(mut self) -> Self {
        self.fail_input = true;
        self
    }

    /// Locking for configuration fails.
    pub fn with_lock_failure(self) -> Self {
        self.set_lock_failure(true);
        self
    }

    /// Locking for configuration blocks until the returned handle is
    /// released, like hardware that hangs.
    pub fn with_stalled_lock(mut self) -> (Self, StallHandle) {
        let stall = Arc::new(Stall::default());
        self.stall = Some(Arc::clone(&stall));
        (self, StallHandle { stall })
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    pub fn with_capture(self, capture: MockCapture) -> Self {
        self.set_capture(capture);
        self
    }

    pub fn set_lock_failure(&self, fail: bool) {
        self.fail_lock.store(fail, Ordering::SeqCst);
    }

    pub fn set_flash_available(&self, available: bool) {
        self.flash_available
            .store(available && self.has_flash, Ordering::SeqCst);
    }

    pub fn set_capture(&self, capture: MockCapture) {
        self.state().capture = capture;
    }

    pub fn is_locked(&self) -> bool {
        self.state().locked
    }

    pub fn focus(&self) -> (FocusMode, FocusPoint) {
        let state = self.state();
        (state.focus_mode, state.focus_point)
    }

    /// Number of still captures requested so far.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn synthetic_jpeg(&self, quality: u8) -> Result<Vec<u8>, DeviceError> {
        let sequence = self.captures.load(Ordering::SeqCst) as u32;
        let (width, height) = (self.frame_width, self.frame_height);
        // Deterministic gradient, distinct per capture.
        let frame = RgbImage::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = (sequence.wrapping_mul(37) % 256) as u8;
            Rgb([r, g, b])
        });

        let mut encoded = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
        DynamicImage::ImageRgb8(frame)
            .write_with_encoder(encoder)
            .map_err(|e| DeviceError::CaptureFailed(e.to_string()))?;
        Ok(encoded)
    }
}

impl CaptureDevice for MockDevice {
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
        if self.fail_input {
            return Err(DeviceError::InputUnavailable(self.id.clone()));
        }
        Ok(())
    }

    fn lock_for_configuration(&self) -> Result<(), DeviceError> {
        if let Some(stall) = &self.stall {
            stall.pass();
        }
        if self.fail_lock.load(Ordering::SeqCst) {
            return Err(DeviceError::LockFailed(self.id.clone()));
        }
        self.state().locked = true;
        Ok(())
    }

    fn unlock_for_configuration(&self) {
        self.state().locked = false;
    }

    fn is_focus_mode_supported(&self, mode: FocusMode) -> bool {
        self.focus_supported || mode == FocusMode::Locked
    }

    fn set_focus(&self, mode: FocusMode, point: FocusPoint) -> Result<(), DeviceError> {
        let mut state = self.state();
        if !state.locked {
            return Err(DeviceError::NotLocked);
        }
        if !(self.focus_supported || mode == FocusMode::Locked) {
            return Err(DeviceError::Unsupported(format!("focus mode {:?}", mode)));
        }
        state.focus_mode = mode;
        state.focus_point = point;
        Ok(())
    }

    fn has_flash(&self) -> bool {
        self.has_flash
    }

    fn is_flash_available(&self) -> bool {
        self.flash_available.load(Ordering::SeqCst)
    }

    fn is_flash_mode_supported(&self, mode: FlashMode) -> bool {
        self.has_flash || mode == FlashMode::Off
    }

    fn flash_mode(&self) -> FlashMode {
        self.state().flash_mode
    }

    fn set_flash_mode(&self, mode: FlashMode) -> Result<(), DeviceError> {
        let mut state = self.state();
        if !state.locked {
            return Err(DeviceError::NotLocked);
        }
        if !(self.has_flash || mode == FlashMode::Off) {
            return Err(DeviceError::Unsupported(format!("flash mode {}", mode)));
        }
        state.flash_mode = mode;
        Ok(())
    }

    fn capture_still(&self, settings: &OutputSettings) -> Result<Vec<u8>, DeviceError> {
        let capture = self.state().capture;
        let result = match capture {
            MockCapture::Fail => Err(DeviceError::CaptureFailed("mock capture failure".into())),
            MockCapture::Empty => Ok(Vec::new()),
            MockCapture::Synthetic => match settings.codec {
                StillCodec::Jpeg => self.synthetic_jpeg(settings.quality),
            },
        };
        self.captures.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Mock device discovery.
#[derive(Debug, Default)]
pub struct MockBackend {
    devices: Vec<Arc<MockDevice>>,
}

impl MockBackend {
    pub fn new(devices: Vec<Arc<MockDevice>>) -> Self {
        Self { devices }
    }

    /// A phone-like setup: back camera with flash, front camera without.
    pub fn phone() -> Self {
        Self::new(vec![Arc::new(MockDevice::back()), Arc::new(MockDevice::front())])
    }

    /// A system with no cameras at all.
    pub fn without_cameras() -> Self {
        Self::default()
    }

    pub fn device(&self, position: CameraPosition) -> Option<&Arc<MockDevice>> {
        self.devices.iter().find(|device| device.position == position)
    }
}

impl CaptureBackend for MockBackend {
    fn default_video_device(&self) -> Option<DeviceHandle> {
        self.devices
            .iter()
            .find(|device| device.position == CameraPosition::Back)
            .or_else(|| self.devices.first())
            .map(|device| Arc::clone(device) as DeviceHandle)
    }

    fn video_devices(&self) -> Vec<DeviceHandle> {
        self.devices
            .iter()
            .map(|device| Arc::clone(device) as DeviceHandle)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ConfigurationLock;

    #[test]
    fn test_synthetic_capture_is_jpeg() {
        let device = MockDevice::back().with_frame_size(32, 16);
        let bytes = device.capture_still(&OutputSettings::default()).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
        assert_eq!(device.capture_count(), 1);
    }

    #[test]
    fn test_injected_capture_results() {
        let device = MockDevice::back().with_capture(MockCapture::Empty);
        assert!(device.capture_still(&OutputSettings::default()).unwrap().is_empty());

        device.set_capture(MockCapture::Fail);
        assert!(matches!(
            device.capture_still(&OutputSettings::default()),
            Err(DeviceError::CaptureFailed(_))
        ));
        assert_eq!(device.capture_count(), 2);
    }

    #[test]
    fn test_stalled_lock_waits_for_release() {
        let (device, stall) = MockDevice::back().with_stalled_lock();
        let device = Arc::new(device);
        assert!(!stall.wait_until_stalled(Duration::from_millis(20)));

        let locker = Arc::clone(&device);
        let thread = std::thread::spawn(move || locker.lock_for_configuration());
        let stalled = stall.wait_until_stalled(Duration::from_secs(5));
        let locked_early = device.is_locked();
        stall.release();

        assert!(stalled);
        assert!(!locked_early);
        assert!(thread.join().unwrap().is_ok());
        assert!(device.is_locked());
    }

    #[test]
    fn test_front_camera_only_supports_flash_off() {
        let device = MockDevice::front();
        assert!(!device.has_flash());
        assert!(device.is_flash_mode_supported(FlashMode::Off));
        assert!(!device.is_flash_mode_supported(FlashMode::Auto));

        let lock = ConfigurationLock::acquire(&device).unwrap();
        assert!(matches!(
            lock.device().set_flash_mode(FlashMode::On),
            Err(DeviceError::Unsupported(_))
        ));
    }

    #[test]
    fn test_lock_failure_toggles_at_runtime() {
        let device = MockDevice::back();
        device.set_lock_failure(true);
        assert!(ConfigurationLock::acquire(&device).is_err());
        device.set_lock_failure(false);
        assert!(ConfigurationLock::acquire(&device).is_ok());
    }

    #[test]
    fn test_backend_device_selection() {
        let backend = MockBackend::phone();
        assert_eq!(
            backend.default_video_device().unwrap().position(),
            CameraPosition::Back
        );
        assert_eq!(
            backend.device_for(CameraPosition::Front).unwrap().unique_id(),
            "mock-front"
        );
        assert!(backend.is_camera_available(CameraPosition::Front));

        let empty = MockBackend::without_cameras();
        assert!(empty.default_video_device().is_none());
        assert!(!empty.is_camera_available(CameraPosition::Back));
    }
}
