//! Captured frame buffers

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba};
use std::time::Duration;

/// Tightly packed BGRA8 frame
#[derive(Debug, Clone)]
pub struct FrameData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Offset from the start of the capture session.
    pub timestamp: Duration,
}

impl FrameData {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Wrap a raw buffer, rejecting one whose length does not match the size.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32, timestamp: Duration) -> Option<Self> {
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        (data.len() == expected).then_some(Self {
            data,
            width,
            height,
            timestamp,
        })
    }

    pub fn stride(&self) -> usize {
        self.width as usize * Self::BYTES_PER_PIXEL
    }

    /// Reverse row order in place (top-down <-> bottom-up).
    pub fn flip_vertical(&mut self) {
        let stride = self.stride();
        let rows = self.height as usize;
        for y in 0..rows / 2 {
            let (top, bottom) = self.data.split_at_mut((rows - 1 - y) * stride);
            top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
    }

    /// Copy into a `width` x `height` canvas, padding with black or clipping.
    ///
    /// The encoder input size is fixed for a session, so frames that arrive
    /// smaller (monitor edge) or larger are fitted to it.
    pub fn fit_to(&self, width: u32, height: u32) -> FrameData {
        if self.width == width && self.height == height {
            return self.clone();
        }

        let dst_stride = width as usize * Self::BYTES_PER_PIXEL;
        let mut data = vec![0u8; dst_stride * height as usize];
        let copy_len = self.width.min(width) as usize * Self::BYTES_PER_PIXEL;

        for y in 0..self.height.min(height) as usize {
            let src = y * self.stride();
            let dst = y * dst_stride;
            data[dst..dst + copy_len].copy_from_slice(&self.data[src..src + copy_len]);
        }

        FrameData {
            data,
            width,
            height,
            timestamp: self.timestamp,
        }
    }

    /// Resample to `width` x `height`. Used when the capture is wider than
    /// the encoder accepts.
    pub fn scale_to(&self, width: u32, height: u32) -> FrameData {
        if self.width == width && self.height == height {
            return self.clone();
        }

        // Channel order does not matter to the filter, so BGRA passes as RGBA.
        let source =
            ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(self.width, self.height, self.data.as_slice());
        let data = match source {
            Some(source) => imageops::resize(&source, width, height, FilterType::Triangle).into_raw(),
            None => vec![0; width as usize * height as usize * Self::BYTES_PER_PIXEL],
        };

        FrameData {
            data,
            width,
            height,
            timestamp: self.timestamp,
        }
    }
}
