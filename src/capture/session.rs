//! Capture session: one camera input feeding one still-image output.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::device::{CameraPosition, CaptureDevice, DeviceError, DeviceHandle};

/// Identifies one session instance for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Quality preset the session is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPreset {
    #[default]
    Photo,
    High,
    Medium,
    Low,
}

/// Codec used to encode still images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StillCodec {
    #[default]
    Jpeg,
}

/// Encoding settings of a still-image output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    pub codec: StillCodec,
    /// Encoder quality, 1 to 100.
    pub quality: u8,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            codec: StillCodec::Jpeg,
            quality: 90,
        }
    }
}

/// A device attached to a session as its video input.
#[derive(Debug, Clone)]
pub struct DeviceInput {
    device: DeviceHandle,
}

impl DeviceInput {
    /// Creates an input for `device`, opening it for capture.
    pub fn new(device: DeviceHandle) -> Result<Self, DeviceError> {
        device.open_input()?;
        Ok(Self { device })
    }

    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }
}

/// Output producing encoded still images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StillImageOutput {
    settings: OutputSettings,
}

impl StillImageOutput {
    pub fn new(settings: OutputSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &OutputSettings {
        &self.settings
    }
}

/// Live link between the session's input and its still-image output.
///
/// Only obtainable from a running session that has both an input and an
/// output attached. It owns its device handle so a capture can proceed on
/// another thread without holding the session.
#[derive(Debug, Clone)]
pub struct StillImageConnection {
    device: DeviceHandle,
    settings: OutputSettings,
}

impl StillImageConnection {
    /// Position of the camera feeding this connection.
    pub fn position(&self) -> CameraPosition {
        self.device.position()
    }

    /// Requests one encoded still frame from the device.
    pub fn capture(&self) -> Result<Vec<u8>, DeviceError> {
        self.device.capture_still(&self.settings)
    }
}

/// Coordinates one camera input and its outputs.
#[derive(Debug)]
pub struct CaptureSession {
    id: SessionId,
    preset: SessionPreset,
    inputs: Vec<DeviceInput>,
    outputs: Vec<StillImageOutput>,
    running: bool,
}

impl CaptureSession {
    pub fn new(id: SessionId, preset: SessionPreset) -> Self {
        Self {
            id,
            preset,
            inputs: Vec::new(),
            outputs: Vec::new(),
            running: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn preset(&self) -> SessionPreset {
        self.preset
    }

    pub fn inputs(&self) -> &[DeviceInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[StillImageOutput] {
        &self.outputs
    }

    pub fn add_input(&mut self, input: DeviceInput) {
        tracing::debug!(
            session = %self.id,
            device = input.device().unique_id(),
            position = %input.device().position(),
            "Input attached"
        );
        self.inputs.push(input);
    }

    /// Detaches and returns the first input, if any.
    pub fn remove_first_input(&mut self) -> Option<DeviceInput> {
        if self.inputs.is_empty() {
            return None;
        }
        Some(self.inputs.remove(0))
    }

    pub fn add_output(&mut self, output: StillImageOutput) {
        self.outputs.push(output);
    }

    /// Removes every input and output.
    pub fn remove_all(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
    }

    /// The device of the first input.
    pub fn current_device(&self) -> Option<&DeviceHandle> {
        self.inputs.first().map(DeviceInput::device)
    }

    pub fn current_position(&self) -> Option<CameraPosition> {
        self.current_device().map(|device| device.position())
    }

    pub fn start_running(&mut self) {
        if !self.running {
            tracing::debug!(session = %self.id, "Session started");
        }
        self.running = true;
    }

    pub fn stop_running(&mut self) {
        if self.running {
            tracing::debug!(session = %self.id, "Session stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The connection of the last output, if the session can capture.
    pub fn still_image_connection(&self) -> Option<StillImageConnection> {
        if !self.running {
            return None;
        }
        let device = self.current_device()?;
        let output = self.outputs.last()?;
        Some(StillImageConnection {
            device: Arc::clone(device),
            settings: output.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockDevice;

    fn attached_session() -> CaptureSession {
        let mut session = CaptureSession::new(SessionId::new(1), SessionPreset::Photo);
        let input = DeviceInput::new(Arc::new(MockDevice::back())).unwrap();
        session.add_input(input);
        session.add_output(StillImageOutput::default());
        session
    }

    #[test]
    fn test_connection_requires_running_session() {
        let mut session = attached_session();
        assert!(session.still_image_connection().is_none());

        session.start_running();
        let connection = session.still_image_connection().unwrap();
        assert_eq!(connection.position(), CameraPosition::Back);

        session.stop_running();
        assert!(session.still_image_connection().is_none());
    }

    #[test]
    fn test_connection_requires_input_and_output() {
        let mut session = CaptureSession::new(SessionId::new(2), SessionPreset::Photo);
        session.start_running();
        assert!(session.still_image_connection().is_none());

        session.add_output(StillImageOutput::default());
        assert!(session.still_image_connection().is_none());
    }

    #[test]
    fn test_remove_all_is_repeatable() {
        let mut session = attached_session();
        session.remove_all();
        session.remove_all();
        assert!(session.inputs().is_empty());
        assert!(session.outputs().is_empty());
        assert!(session.remove_first_input().is_none());
    }

    #[test]
    fn test_input_creation_failure() {
        let device = Arc::new(MockDevice::back().with_input_failure());
        assert!(matches!(
            DeviceInput::new(device),
            Err(DeviceError::InputUnavailable(_))
        ));
    }
}
