//! Decoded, orientation-tagged image produced by a capture or a picker.

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::DeviceError;
use crate::orientation::ImageOrientation;

/// Errors that can occur while producing a still image.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture returned no image data")]
    EmptyBuffer,
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("failed to decode still image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Where an image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageSource {
    /// The custom camera's shutter.
    Shutter,
    /// The photo library picker.
    PhotoLibrary,
    /// The system camera picker.
    SystemCamera,
}

/// A decoded image plus the tag describing how to display it.
///
/// The pixel data is kept exactly as captured; `orientation` tells the
/// consumer how to present it.
#[derive(Clone)]
pub struct CapturedImage {
    image: DynamicImage,
    orientation: ImageOrientation,
    source: ImageSource,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(image: DynamicImage, orientation: ImageOrientation, source: ImageSource) -> Self {
        Self {
            image,
            orientation,
            source,
            captured_at: Utc::now(),
        }
    }

    /// Decodes JPEG bytes from the shutter and tags them with `orientation`.
    pub fn decode_jpeg(bytes: &[u8], orientation: ImageOrientation) -> Result<Self, CaptureError> {
        if bytes.is_empty() {
            return Err(CaptureError::EmptyBuffer);
        }
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
        Ok(Self::new(image, orientation, ImageSource::Shutter))
    }

    /// The stored, untransformed pixels.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn orientation(&self) -> ImageOrientation {
        self.orientation
    }

    pub fn source(&self) -> ImageSource {
        self.source
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Width and height of the stored pixel buffer.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Width and height once displayed upright.
    pub fn display_dimensions(&self) -> (u32, u32) {
        let (width, height) = self.dimensions();
        if self.orientation.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// A copy of the image with the orientation applied to the pixels.
    pub fn to_display(&self) -> DynamicImage {
        let mut upright = self.image.clone();
        upright.apply_orientation(self.orientation.transform());
        upright
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("orientation", &self.orientation)
            .field("source", &self.source)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureDevice, MockDevice, OutputSettings};
    use image::{Rgb, RgbImage};

    #[test]
    fn test_decode_keeps_pixels_unrotated() {
        let device = MockDevice::back().with_frame_size(40, 30);
        let bytes = device.capture_still(&OutputSettings::default()).unwrap();

        let captured = CapturedImage::decode_jpeg(&bytes, ImageOrientation::Right).unwrap();
        assert_eq!(captured.dimensions(), (40, 30));
        assert_eq!(captured.display_dimensions(), (30, 40));
        assert_eq!(captured.source(), ImageSource::Shutter);
    }

    #[test]
    fn test_empty_buffer_rejected() {
        assert!(matches!(
            CapturedImage::decode_jpeg(&[], ImageOrientation::Up),
            Err(CaptureError::EmptyBuffer)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            CapturedImage::decode_jpeg(&[0x00, 0x01, 0x02], ImageOrientation::Up),
            Err(CaptureError::Decode(_))
        ));
    }

    #[test]
    fn test_to_display_applies_tag() {
        // Red pixel at the stored top-left corner.
        let mut pixels = RgbImage::new(2, 1);
        pixels.put_pixel(0, 0, Rgb([255, 0, 0]));
        let captured = CapturedImage::new(
            DynamicImage::ImageRgb8(pixels),
            ImageOrientation::Right,
            ImageSource::PhotoLibrary,
        );

        let upright = captured.to_display().to_rgb8();
        assert_eq!(upright.dimensions(), (1, 2));
        // A clockwise quarter turn keeps the stored top-left pixel on the top row.
        assert_eq!(upright.get_pixel(0, 0), &Rgb([255, 0, 0]));
        // The stored buffer is untouched.
        assert_eq!(captured.dimensions(), (2, 1));
    }
}
