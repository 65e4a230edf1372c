//! Presentation state of the camera screen's controls.
//!
//! The screen never draws anything. It keeps this plain description of
//! every control up to date, and the presentation layer renders it,
//! animating changes with the durations carried here.

use std::time::Duration;

use crate::capture::FlashMode;
use crate::config::UiConfig;

/// The actionable controls of the camera screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Flash,
    FlashAuto,
    FlashOn,
    FlashOff,
    CameraSwitch,
    PhotoLibrary,
    Shutter,
    Cancel,
}

impl Control {
    /// Controls counter-rotated when the device rotates.
    pub const ROTATED: [Control; 8] = [
        Control::Flash,
        Control::FlashAuto,
        Control::FlashOn,
        Control::FlashOff,
        Control::CameraSwitch,
        Control::PhotoLibrary,
        Control::Shutter,
        Control::Cancel,
    ];

    /// The chooser option selecting `mode`.
    pub fn flash_option(mode: FlashMode) -> Control {
        match mode {
            FlashMode::Auto => Control::FlashAuto,
            FlashMode::On => Control::FlashOn,
            FlashMode::Off => Control::FlashOff,
        }
    }
}

/// Visibility and interactivity of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub hidden: bool,
    pub enabled: bool,
}

impl ButtonState {
    pub const VISIBLE: ButtonState = ButtonState {
        hidden: false,
        enabled: true,
    };

    /// Visible and enabled.
    pub fn is_usable(&self) -> bool {
        !self.hidden && self.enabled
    }
}

impl Default for ButtonState {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Everything the presentation layer needs to render the camera screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    pub flash_button: ButtonState,
    pub camera_button: ButtonState,
    pub shutter: ButtonState,
    /// Whether the three flash options are shown.
    pub flash_chooser_visible: bool,
    /// Whether the shutter is shown; always the opposite of the chooser.
    pub shutter_visible: bool,
    /// Option currently marked selected in the chooser.
    pub selected_flash: Option<FlashMode>,
    /// Icon asset for the flash button.
    pub flash_icon: Option<&'static str>,
    /// Rotation in radians applied to every control in [`Control::ROTATED`].
    pub chrome_rotation: f64,
    /// Blur overlay covering the preview while cameras are switched.
    pub blur_visible: bool,
    pub flip_in_progress: bool,
    pub preview_attached: bool,
    pub chooser_fade: Duration,
    pub flip_transition: Duration,
    pub rotation_duration: Duration,
}

impl ControlState {
    /// Initial state: chooser hidden, shutter shown, no flash information yet.
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            flash_button: ButtonState::VISIBLE,
            camera_button: ButtonState::VISIBLE,
            shutter: ButtonState::VISIBLE,
            flash_chooser_visible: false,
            shutter_visible: true,
            selected_flash: None,
            flash_icon: None,
            chrome_rotation: 0.0,
            blur_visible: false,
            flip_in_progress: false,
            preview_attached: false,
            chooser_fade: ui.chooser_fade(),
            flip_transition: ui.flip_transition(),
            rotation_duration: ui.rotation(),
        }
    }

    pub fn is_selected(&self, option: Control) -> bool {
        self.selected_flash
            .map(|mode| Control::flash_option(mode) == option)
            .unwrap_or(false)
    }

    /// Shows or hides the flash chooser, fading the shutter the other way.
    pub(crate) fn toggle_flash_chooser(&mut self) {
        self.flash_chooser_visible = !self.flash_chooser_visible;
        self.shutter_visible = !self.flash_chooser_visible;
    }

    pub(crate) fn show_flash_mode(&mut self, mode: FlashMode) {
        self.selected_flash = Some(mode);
        self.flash_icon = Some(mode.icon_name());
    }
}
