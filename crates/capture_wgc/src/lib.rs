//! Screen geometry and Windows Graphics Capture frame source for ScreenRec
//!
//! The geometry model (`Rect`, `RecordingRegion`, `AspectRatioPreset`) is
//! platform independent. The WGC frame source is only built on Windows.

pub mod frame;
pub mod preset;
pub mod region;

#[cfg(windows)]
pub mod capture;

#[cfg(windows)]
pub use capture::{monitor_crop_for, CaptureController, MonitorCrop};
pub use frame::FrameData;
pub use preset::{AspectRatioPreset, PRESETS};
pub use region::{CaptureMode, RecordingRegion, MIN_REGION_SIZE};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Windows(#[from] windows::core::Error),

    #[error("D3D11 error: {0}")]
    D3D11(String),

    #[error("Capture region {0:?} is outside every monitor")]
    OffScreen(Rect),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Rectangle in physical pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from left/top/right/bottom edges; inverted edges give an empty rect.
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: (right - left).max(0) as u32,
            height: (bottom - top).max(0) as u32,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && self.right() > other.x &&
        self.y < other.bottom() && self.bottom() > other.y
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::from_ltrb(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        ))
    }

    /// Same origin, width and height rounded down to even numbers.
    pub fn align_even(&self) -> Rect {
        Rect::new(self.x, self.y, self.width & !1, self.height & !1)
    }

    /// Grow outward by `amount` pixels on every side.
    pub fn inflate(&self, amount: u32) -> Rect {
        Rect::new(
            self.x - amount as i32,
            self.y - amount as i32,
            self.width + amount * 2,
            self.height + amount * 2,
        )
    }

    /// Same origin moved so that it is relative to `origin`.
    pub fn relative_to(&self, origin: (i32, i32)) -> Rect {
        Rect::new(self.x - origin.0, self.y - origin.1, self.width, self.height)
    }
}
