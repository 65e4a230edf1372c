//! Captured photos handed to the viewer.

mod captured;

pub use captured::{CaptureError, CapturedImage, ImageSource};
