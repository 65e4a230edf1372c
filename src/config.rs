//! Camera screen configuration.
//!
//! Loaded from a TOML file with one table per concern. Every table has
//! defaults matching the stock camera screen, so an empty file is valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::{FocusPoint, OutputSettings, SessionPreset, StillCodec};

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("focus point must lie within 0.0..=1.0")]
    InvalidFocusPoint,
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    #[error("animation duration `{0}` must be non-zero")]
    InvalidDuration(&'static str),
    #[error("worker thread name must not be empty")]
    InvalidThreadName,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Capture session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session quality preset.
    pub preset: SessionPreset,
    /// Still image codec.
    pub codec: StillCodec,
    /// Still image encoder quality (1-100).
    pub jpeg_quality: u8,
    /// Continuous autofocus point of interest.
    pub focus_point: FocusPoint,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preset: SessionPreset::Photo,
            codec: StillCodec::Jpeg,
            jpeg_quality: 90,
            focus_point: FocusPoint::CENTER,
        }
    }
}

impl SessionConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.focus_point.is_normalized() {
            return Err(ConfigError::InvalidFocusPoint);
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }
        Ok(())
    }

    /// Settings for the session's still-image output.
    pub fn output_settings(&self) -> OutputSettings {
        OutputSettings {
            codec: self.codec,
            quality: self.jpeg_quality,
        }
    }
}

/// Animation timings handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Fade of the flash chooser and shutter button, in milliseconds.
    pub chooser_fade_ms: u64,
    /// Flip transition played while switching cameras, in milliseconds.
    pub flip_transition_ms: u64,
    /// Counter-rotation of the buttons on device rotation, in milliseconds.
    pub rotation_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            chooser_fade_ms: 300,
            flip_transition_ms: 500,
            rotation_ms: 300,
        }
    }
}

impl UiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chooser_fade_ms == 0 {
            return Err(ConfigError::InvalidDuration("chooser_fade_ms"));
        }
        if self.flip_transition_ms == 0 {
            return Err(ConfigError::InvalidDuration("flip_transition_ms"));
        }
        if self.rotation_ms == 0 {
            return Err(ConfigError::InvalidDuration("rotation_ms"));
        }
        Ok(())
    }

    pub fn chooser_fade(&self) -> Duration {
        Duration::from_millis(self.chooser_fade_ms)
    }

    pub fn flip_transition(&self) -> Duration {
        Duration::from_millis(self.flip_transition_ms)
    }

    pub fn rotation(&self) -> Duration {
        Duration::from_millis(self.rotation_ms)
    }
}

/// Background work queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Name of the serial worker thread.
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: "capture-queue".to_string(),
        }
    }
}

/// Hardware webcam configuration, used by the `camera` feature.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NativeConfig {
    /// Index of the device treated as the back camera.
    pub default_device: u32,
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub native: NativeConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        self.ui.validate()?;
        if self.worker.thread_name.trim().is_empty() {
            return Err(ConfigError::InvalidThreadName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ui.flip_transition(), Duration::from_millis(500));
        assert_eq!(config.session.output_settings().quality, 90);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert_eq!(config.session.focus_point, FocusPoint::CENTER);
        assert_eq!(config.worker.thread_name, "capture-queue");
    }

    #[test]
    fn test_invalid_quality_rejected() {
        let result = FileConfig::from_toml("[session]\njpeg_quality = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidQuality(0))));
    }

    #[test]
    fn test_focus_point_out_of_range() {
        let result = FileConfig::from_toml("[session]\nfocus_point = { x = 2.0, y = 0.5 }\n");
        assert!(matches!(result, Err(ConfigError::InvalidFocusPoint)));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let result = FileConfig::from_toml("[ui]\nrotation_ms = 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration("rotation_ms"))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\njpeg_quality = 75\npreset = \"high\"").unwrap();
        writeln!(file, "[worker]\nthread_name = \"cam\"").unwrap();

        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.session.jpeg_quality, 75);
        assert_eq!(config.session.preset, SessionPreset::High);
        assert_eq!(config.worker.thread_name, "cam");
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FileConfig::from_file("/nonexistent/camera.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
