//! Image orientation tags for captured frames.

use image::metadata::Orientation;
use serde::{Deserialize, Serialize};

use super::DeviceOrientation;
use crate::capture::CameraPosition;

/// How stored pixel data must be transformed for display.
///
/// Names describe where the top of the picture ended up in the stored
/// buffer. Mirrored variants are produced by front cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageOrientation {
    #[default]
    Up,
    Down,
    Left,
    Right,
    UpMirrored,
    DownMirrored,
    LeftMirrored,
    RightMirrored,
}

impl ImageOrientation {
    pub const ALL: [ImageOrientation; 8] = [
        ImageOrientation::Up,
        ImageOrientation::Down,
        ImageOrientation::Left,
        ImageOrientation::Right,
        ImageOrientation::UpMirrored,
        ImageOrientation::DownMirrored,
        ImageOrientation::LeftMirrored,
        ImageOrientation::RightMirrored,
    ];

    /// EXIF `Orientation` tag value (1-8).
    pub fn exif(self) -> u8 {
        match self {
            ImageOrientation::Up => 1,
            ImageOrientation::UpMirrored => 2,
            ImageOrientation::Down => 3,
            ImageOrientation::DownMirrored => 4,
            ImageOrientation::LeftMirrored => 5,
            ImageOrientation::Right => 6,
            ImageOrientation::RightMirrored => 7,
            ImageOrientation::Left => 8,
        }
    }

    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            ImageOrientation::UpMirrored
                | ImageOrientation::DownMirrored
                | ImageOrientation::LeftMirrored
                | ImageOrientation::RightMirrored
        )
    }

    /// True when displaying the image swaps its width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            ImageOrientation::Left
                | ImageOrientation::Right
                | ImageOrientation::LeftMirrored
                | ImageOrientation::RightMirrored
        )
    }

    /// The transform `image` applies to turn stored pixels upright.
    pub fn transform(self) -> Orientation {
        match self {
            ImageOrientation::Up => Orientation::NoTransforms,
            ImageOrientation::UpMirrored => Orientation::FlipHorizontal,
            ImageOrientation::Down => Orientation::Rotate180,
            ImageOrientation::DownMirrored => Orientation::FlipVertical,
            ImageOrientation::LeftMirrored => Orientation::Rotate90FlipH,
            ImageOrientation::Right => Orientation::Rotate90,
            ImageOrientation::RightMirrored => Orientation::Rotate270FlipH,
            ImageOrientation::Left => Orientation::Rotate270,
        }
    }
}

/// Tag for a frame captured by the camera facing `position` while the
/// device is held in `orientation`.
pub fn image_orientation(
    orientation: DeviceOrientation,
    position: CameraPosition,
) -> ImageOrientation {
    match (position, orientation) {
        (CameraPosition::Back, DeviceOrientation::LandscapeLeft) => ImageOrientation::Up,
        (CameraPosition::Back, DeviceOrientation::LandscapeRight) => ImageOrientation::Down,
        (CameraPosition::Back, DeviceOrientation::PortraitUpsideDown) => ImageOrientation::Left,
        (CameraPosition::Back, _) => ImageOrientation::Right,
        (CameraPosition::Front, DeviceOrientation::LandscapeLeft) => {
            ImageOrientation::DownMirrored
        }
        (CameraPosition::Front, DeviceOrientation::LandscapeRight) => {
            ImageOrientation::UpMirrored
        }
        (CameraPosition::Front, DeviceOrientation::PortraitUpsideDown) => {
            ImageOrientation::RightMirrored
        }
        (CameraPosition::Front, _) => ImageOrientation::LeftMirrored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_back_camera_table() {
        use DeviceOrientation::*;
        let back = CameraPosition::Back;
        assert_eq!(image_orientation(LandscapeLeft, back), ImageOrientation::Up);
        assert_eq!(image_orientation(LandscapeRight, back), ImageOrientation::Down);
        assert_eq!(image_orientation(PortraitUpsideDown, back), ImageOrientation::Left);
        assert_eq!(image_orientation(Portrait, back), ImageOrientation::Right);
        assert_eq!(image_orientation(FaceUp, back), ImageOrientation::Right);
    }

    #[test]
    fn test_front_camera_table() {
        use DeviceOrientation::*;
        let front = CameraPosition::Front;
        assert_eq!(
            image_orientation(LandscapeLeft, front),
            ImageOrientation::DownMirrored
        );
        assert_eq!(
            image_orientation(LandscapeRight, front),
            ImageOrientation::UpMirrored
        );
        assert_eq!(
            image_orientation(PortraitUpsideDown, front),
            ImageOrientation::RightMirrored
        );
        assert_eq!(image_orientation(Unknown, front), ImageOrientation::LeftMirrored);
    }

    #[test]
    fn test_exif_values_are_distinct() {
        let mut values: Vec<u8> = ImageOrientation::ALL.iter().map(|o| o.exif()).collect();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    proptest! {
        #[test]
        fn test_mirrored_iff_front(
            index in 0usize..DeviceOrientation::ALL.len(),
            front in any::<bool>(),
        ) {
            let orientation = DeviceOrientation::ALL[index];
            let position = if front { CameraPosition::Front } else { CameraPosition::Back };
            let tag = image_orientation(orientation, position);
            prop_assert_eq!(tag.is_mirrored(), front);
        }

        #[test]
        fn test_landscape_keeps_dimensions(
            index in 0usize..DeviceOrientation::ALL.len(),
            front in any::<bool>(),
        ) {
            let orientation = DeviceOrientation::ALL[index];
            let position = if front { CameraPosition::Front } else { CameraPosition::Back };
            let landscape = matches!(
                orientation,
                DeviceOrientation::LandscapeLeft | DeviceOrientation::LandscapeRight
            );
            prop_assert_eq!(
                image_orientation(orientation, position).swaps_dimensions(),
                !landscape
            );
        }
    }
}
