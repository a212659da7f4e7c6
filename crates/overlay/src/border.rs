//! Recording border geometry and style
//!
//! The outline sits outside the capture rectangle so it never overlaps
//! captured pixels.

use crate::OverlayResult;
use capture_wgc::Rect;

/// Outline shown around the active capture rectangle
pub trait CaptureBorder {
    fn show(&mut self, capture: Rect) -> OverlayResult<()>;

    /// Dim (or restore) the outline while the recording is paused.
    fn set_paused(&mut self, paused: bool);

    /// Tear the outline down. Calling it again is a no-op.
    fn close(&mut self);

    fn is_visible(&self) -> bool;
}

/// Colours are `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderStyle {
    pub color: u32,
    pub paused_color: u32,
    pub thickness: u32,
}

impl Default for BorderStyle {
    fn default() -> Self {
        Self {
            color: 0xE81123,
            paused_color: 0xFFB900,
            thickness: 3,
        }
    }
}

impl BorderStyle {
    pub fn color_for(&self, paused: bool) -> u32 {
        if paused {
            self.paused_color
        } else {
            self.color
        }
    }

    /// Parse `RRGGBB` or `#RRGGBB`.
    pub fn parse_color(text: &str) -> Option<u32> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()
    }
}

/// Window bounds for an outline of `thickness` around `capture`.
pub fn border_frame(capture: Rect, thickness: u32) -> Rect {
    capture.inflate(thickness)
}

/// The four bars of the outline in client coordinates of a `width` x
/// `height` frame window: top, bottom, left, right.
pub fn edge_rects(width: u32, height: u32, thickness: u32) -> [Rect; 4] {
    let t = thickness.min(width / 2).min(height / 2);
    let inner_height = height.saturating_sub(t * 2);
    [
        Rect::new(0, 0, width, t),
        Rect::new(0, (height - t) as i32, width, t),
        Rect::new(0, t as i32, t, inner_height),
        Rect::new((width - t) as i32, t as i32, t, inner_height),
    ]
}

/// `0xRRGGBB` to GDI's `0x00BBGGRR`.
pub fn to_colorref(rgb: u32) -> u32 {
    ((rgb & 0xFF) << 16) | (rgb & 0xFF00) | ((rgb >> 16) & 0xFF)
}
