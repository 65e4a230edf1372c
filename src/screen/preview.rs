//! Preview binding between a capture session and the screen.

use crate::capture::SessionId;

/// Rectangle in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Live preview of a session's input.
///
/// The preview always fills its frame, cropping the overflow.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewLayer {
    session: SessionId,
    frame: Rect,
}

impl PreviewLayer {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            frame: Rect::default(),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
    }
}
