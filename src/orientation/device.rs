//! Physical device orientation and control counter-rotation.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

/// Physical orientation reported by the device's motion sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceOrientation {
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    /// Device rotated so the home edge is on the right.
    LandscapeLeft,
    /// Device rotated so the home edge is on the left.
    LandscapeRight,
    FaceUp,
    FaceDown,
}

impl DeviceOrientation {
    pub const ALL: [DeviceOrientation; 7] = [
        DeviceOrientation::Unknown,
        DeviceOrientation::Portrait,
        DeviceOrientation::PortraitUpsideDown,
        DeviceOrientation::LandscapeLeft,
        DeviceOrientation::LandscapeRight,
        DeviceOrientation::FaceUp,
        DeviceOrientation::FaceDown,
    ];
}

/// Rotation in radians applied to every control for `orientation`.
///
/// Controls are rotated in place, never repositioned.
pub fn chrome_rotation(orientation: DeviceOrientation) -> f64 {
    match orientation {
        DeviceOrientation::PortraitUpsideDown => PI,
        DeviceOrientation::LandscapeLeft => FRAC_PI_2,
        DeviceOrientation::LandscapeRight => -FRAC_PI_2,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_discrete_rotations() {
        assert_eq!(chrome_rotation(DeviceOrientation::PortraitUpsideDown), PI);
        assert_eq!(chrome_rotation(DeviceOrientation::LandscapeLeft), PI / 2.0);
        assert_eq!(chrome_rotation(DeviceOrientation::LandscapeRight), -PI / 2.0);
        assert_eq!(chrome_rotation(DeviceOrientation::Portrait), 0.0);
    }

    proptest! {
        #[test]
        fn test_flat_and_unknown_are_upright(index in 0usize..DeviceOrientation::ALL.len()) {
            let orientation = DeviceOrientation::ALL[index];
            let angle = chrome_rotation(orientation);
            match orientation {
                DeviceOrientation::PortraitUpsideDown
                | DeviceOrientation::LandscapeLeft
                | DeviceOrientation::LandscapeRight => prop_assert!(angle != 0.0),
                _ => prop_assert_eq!(angle, 0.0),
            }
            prop_assert!(angle.abs() <= PI);
        }
    }
}
