//! Hardware work run on the background queue.
//!
//! Device calls can block for as long as the hardware takes, so they run
//! without holding the shared session slot. The slot is locked only for
//! short critical sections that check the session the work was scheduled
//! for is still current and attach or detach inputs and outputs.
//! None of these functions touch presentation state; results travel back
//! to the UI thread as messages.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::preview::PreviewLayer;
use crate::capture::{
    CameraPosition, CaptureBackend, CaptureSession, ConfigurationLock, DeviceError, DeviceHandle,
    DeviceInput, FlashMode, FocusMode, SessionId, StillImageOutput,
};
use crate::config::SessionConfig;
use crate::worker::CancelToken;

/// The screen's single session, shared with the work queue.
pub(crate) type SessionSlot = Arc<Mutex<Option<CaptureSession>>>;

pub(crate) fn lock_slot(slot: &SessionSlot) -> MutexGuard<'_, Option<CaptureSession>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Why a background reconfiguration did not complete.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no video capture device available")]
    NoDevice,
    #[error("session has no input attached")]
    NoInput,
    #[error("background work was cancelled")]
    Cancelled,
    #[error("session was released")]
    SessionReleased,
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Outcome of a successful session bring-up.
#[derive(Debug, Clone)]
pub(crate) struct SetupReport {
    pub flash_mode: FlashMode,
    pub has_flash: bool,
    pub both_cameras: bool,
    pub preview: PreviewLayer,
}

/// Outcome of a camera switch.
#[derive(Debug)]
pub(crate) struct SwitchReport {
    /// Position now feeding the session, or why the switch failed.
    pub result: Result<CameraPosition, SessionError>,
    /// Flash availability of the device attached after the task.
    pub flash_available: bool,
}

impl SwitchReport {
    fn failed(error: SessionError, flash_available: bool) -> Self {
        Self {
            result: Err(error),
            flash_available,
        }
    }
}

fn session_mut<'a>(
    guard: &'a mut MutexGuard<'_, Option<CaptureSession>>,
    id: SessionId,
) -> Result<&'a mut CaptureSession, SessionError> {
    match guard.as_mut() {
        Some(session) if session.id() == id => Ok(session),
        _ => Err(SessionError::SessionReleased),
    }
}

fn ensure_current(slot: &SessionSlot, id: SessionId) -> Result<(), SessionError> {
    let mut guard = lock_slot(slot);
    session_mut(&mut guard, id)?;
    Ok(())
}

/// Handle to the device feeding session `id`. The slot is released on return.
fn current_device(slot: &SessionSlot, id: SessionId) -> Result<DeviceHandle, SessionError> {
    let mut guard = lock_slot(slot);
    let session = session_mut(&mut guard, id)?;
    let device = session.current_device().cloned();
    device.ok_or(SessionError::NoInput)
}

fn check_cancelled(token: &CancelToken) -> Result<(), SessionError> {
    if token.is_cancelled() {
        return Err(SessionError::Cancelled);
    }
    Ok(())
}

/// Brings session `id` from empty to fully configured.
///
/// Opens the default video device, configures continuous autofocus and
/// the initial flash mode under the configuration lock, then attaches the
/// input and a still-image output. The session is not started.
pub(crate) fn configure_session(
    slot: &SessionSlot,
    backend: &dyn CaptureBackend,
    id: SessionId,
    config: &SessionConfig,
    token: &CancelToken,
) -> Result<SetupReport, SessionError> {
    ensure_current(slot, id)?;
    check_cancelled(token)?;

    let device = backend.default_video_device().ok_or(SessionError::NoDevice)?;
    let input = DeviceInput::new(Arc::clone(&device))?;

    let flash_mode = {
        let lock = ConfigurationLock::acquire(device.as_ref())?;
        let device = lock.device();

        if device.is_focus_mode_supported(FocusMode::ContinuousAutoFocus) {
            if let Err(e) = device.set_focus(FocusMode::ContinuousAutoFocus, config.focus_point) {
                tracing::warn!(error = %e, "Failed to enable continuous autofocus");
            }
        }

        let mode = if device.is_flash_mode_supported(FlashMode::Auto) {
            FlashMode::Auto
        } else {
            FlashMode::Off
        };
        if let Err(e) = device.set_flash_mode(mode) {
            tracing::warn!(error = %e, %mode, "Failed to set initial flash mode");
        }
        device.flash_mode()
    };
    check_cancelled(token)?;

    let has_flash = device.has_flash();
    let both_cameras = backend.is_camera_available(CameraPosition::Front)
        && backend.is_camera_available(CameraPosition::Back);

    {
        let mut guard = lock_slot(slot);
        let session = session_mut(&mut guard, id)?;
        session.add_input(input);
        session.add_output(StillImageOutput::new(config.output_settings()));
    }

    tracing::info!(
        session = %id,
        device = device.name(),
        flash = %flash_mode,
        "Capture session configured"
    );

    Ok(SetupReport {
        flash_mode,
        has_flash,
        both_cameras,
        preview: PreviewLayer::new(id),
    })
}

/// Replaces the session's input with the camera on the other side.
///
/// `flash_available` is told about the new device as soon as it is chosen.
/// The previous input stays attached until the new one has been opened, so
/// a failed switch leaves the session on the camera it had.
pub(crate) fn switch_input(
    slot: &SessionSlot,
    backend: &dyn CaptureBackend,
    id: SessionId,
    token: &CancelToken,
    flash_available: impl FnOnce(bool),
) -> SwitchReport {
    let previous = match current_device(slot, id) {
        Ok(device) => device,
        Err(e) => return SwitchReport::failed(e, false),
    };
    if let Err(e) = check_cancelled(token) {
        return SwitchReport::failed(e, previous.is_flash_available());
    }

    let current = previous.position();
    let target = current.opposite();
    let Some(device) = backend.device_for(target) else {
        tracing::debug!(%target, "No camera on the other side");
        return SwitchReport::failed(SessionError::NoDevice, previous.is_flash_available());
    };
    flash_available(device.is_flash_available());

    let input = match DeviceInput::new(Arc::clone(&device)) {
        Ok(input) => input,
        Err(e) => {
            tracing::debug!(error = %e, %target, "Camera switch aborted");
            return SwitchReport::failed(e.into(), previous.is_flash_available());
        }
    };

    {
        let mut guard = lock_slot(slot);
        let session = match session_mut(&mut guard, id) {
            Ok(session) => session,
            Err(e) => return SwitchReport::failed(e, false),
        };
        session.remove_first_input();
        session.add_input(input);
    }

    tracing::info!(session = %id, from = %current, to = %target, "Camera switched");
    SwitchReport {
        result: Ok(target),
        flash_available: device.is_flash_available(),
    }
}

/// Applies `mode` to the session's current device.
pub(crate) fn apply_flash_mode(
    slot: &SessionSlot,
    id: SessionId,
    mode: FlashMode,
) -> Result<FlashMode, SessionError> {
    let device = current_device(slot, id)?;

    let lock = ConfigurationLock::acquire(device.as_ref())?;
    if !lock.device().is_flash_mode_supported(mode) {
        return Err(DeviceError::Unsupported(format!("flash mode {}", mode)).into());
    }
    lock.device().set_flash_mode(mode)?;
    Ok(mode)
}
