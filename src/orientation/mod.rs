//! Device orientation handling.
//!
//! Two independent concerns are driven by device rotation:
//!
//! - the on-screen controls are counter-rotated so their icons stay upright
//!   ([`chrome_rotation`]);
//! - captured frames are tagged with an [`ImageOrientation`] describing how
//!   the unrotated pixel data must be displayed ([`image_orientation`]).

mod device;
mod tag;

pub use device::{chrome_rotation, DeviceOrientation};
pub use tag::{image_orientation, ImageOrientation};
