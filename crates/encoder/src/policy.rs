//! Capture geometry and bitrate/framerate policy

use crate::{EncoderError, EncoderResult};
use capture_wgc::{CaptureMode, Rect, RecordingRegion};

/// Widest frame the H.264 encoder is asked to produce.
pub const MAX_ENCODER_WIDTH: u32 = 4096;

/// Output frames above this pixel count use the 4K tier and software encoding.
pub const UHD_PIXEL_THRESHOLD: u64 = 4_000_000;

/// Output frames above this pixel count use the high tier.
pub const QHD_PIXEL_THRESHOLD: u64 = 2_000_000;

/// Bitrate, frame rate and encoder path for an output size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityPolicy {
    /// Bits per second.
    pub bitrate: u32,
    pub frame_rate: u32,
    pub hardware: bool,
}

impl QualityPolicy {
    /// Pick the policy for an output frame of `pixels` pixels.
    ///
    /// Hardware encoders can reject very large frames, so anything above the
    /// 4K threshold goes through the software path.
    pub fn for_pixels(pixels: u64) -> Self {
        if pixels > UHD_PIXEL_THRESHOLD {
            Self { bitrate: 20_000_000, frame_rate: 24, hardware: false }
        } else if pixels > QHD_PIXEL_THRESHOLD {
            Self { bitrate: 15_000_000, frame_rate: 30, hardware: true }
        } else {
            Self { bitrate: 8_000_000, frame_rate: 30, hardware: true }
        }
    }
}

/// Source rectangle handed to the capture side.
///
/// Full screen is anchored at the virtual-screen origin (the primary
/// monitor). Region and window captures keep their absolute offset with both
/// sides aligned down to even numbers.
pub fn capture_rect_for(region: &RecordingRegion) -> Rect {
    match region.mode {
        CaptureMode::FullScreen => Rect::new(0, 0, region.rect.width, region.rect.height),
        CaptureMode::Region | CaptureMode::Window => region.rect.align_even(),
    }
}

/// Encoded frame size for a capture of `width` x `height`.
pub fn output_size(width: u32, height: u32) -> (u32, u32) {
    if width > MAX_ENCODER_WIDTH {
        let scale = MAX_ENCODER_WIDTH as f64 / width as f64;
        let scaled_height = (height as f64 * scale).round() as u32;
        (MAX_ENCODER_WIDTH & !1, scaled_height & !1)
    } else {
        (width & !1, height & !1)
    }
}

/// Everything the encoder backend needs to configure a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderParams {
    pub mode: CaptureMode,
    /// Absolute screen rectangle to capture.
    pub capture: Rect,
    pub output_width: u32,
    pub output_height: u32,
    pub quality: QualityPolicy,
}

impl EncoderParams {
    pub fn for_region(region: &RecordingRegion) -> EncoderResult<Self> {
        if !region.is_valid() {
            return Err(EncoderError::InvalidRegion(region.rect));
        }

        let capture = capture_rect_for(region);
        let (output_width, output_height) = output_size(capture.width, capture.height);
        if output_width == 0 || output_height == 0 {
            return Err(EncoderError::InvalidRegion(region.rect));
        }

        let quality = QualityPolicy::for_pixels(output_width as u64 * output_height as u64);

        log::debug!(
            "Encoder params: capture {:?} -> output {}x{}, {} bps @ {} fps, {}",
            capture,
            output_width,
            output_height,
            quality.bitrate,
            quality.frame_rate,
            if quality.hardware { "hardware" } else { "software" }
        );

        Ok(Self {
            mode: region.mode,
            capture,
            output_width,
            output_height,
            quality,
        })
    }

    pub fn is_scaled(&self) -> bool {
        self.capture.width != self.output_width || self.capture.height != self.output_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: i32, y: i32, w: u32, h: u32, mode: CaptureMode) -> RecordingRegion {
        RecordingRegion::new(Rect::new(x, y, w, h), mode)
    }

    #[test]
    fn test_output_size_scales_wide_captures() {
        assert_eq!(output_size(5120, 2880), (4096, 2304));
        // 2161 * 0.8 = 1728.8 -> 1729 -> even 1728
        assert_eq!(output_size(5120, 2161), (4096, 1728));
    }

    #[test]
    fn test_output_size_keeps_small_captures() {
        assert_eq!(output_size(1920, 1080), (1920, 1080));
        assert_eq!(output_size(4096, 2160), (4096, 2160));
        assert_eq!(output_size(1001, 555), (1000, 554));
    }

    #[test]
    fn test_quality_tiers() {
        let uhd = QualityPolicy::for_pixels(4_000_001);
        assert_eq!((uhd.bitrate, uhd.frame_rate, uhd.hardware), (20_000_000, 24, false));

        let at_uhd_threshold = QualityPolicy::for_pixels(4_000_000);
        assert_eq!(at_uhd_threshold.bitrate, 15_000_000);
        assert!(at_uhd_threshold.hardware);

        let qhd = QualityPolicy::for_pixels(2_000_001);
        assert_eq!((qhd.bitrate, qhd.frame_rate), (15_000_000, 30));

        let hd = QualityPolicy::for_pixels(2_000_000);
        assert_eq!((hd.bitrate, hd.frame_rate, hd.hardware), (8_000_000, 30, true));
    }

    #[test]
    fn test_full_screen_is_anchored_at_origin() {
        let params = EncoderParams::for_region(&region(120, 40, 1920, 1040, CaptureMode::FullScreen))
            .expect("valid region");
        assert_eq!(params.capture, Rect::new(0, 0, 1920, 1040));
    }

    #[test]
    fn test_region_keeps_offset_and_aligns_even() {
        let params = EncoderParams::for_region(&region(-1915, 33, 801, 451, CaptureMode::Region))
            .expect("valid region");
        assert_eq!(params.capture, Rect::new(-1915, 33, 800, 450));
        assert_eq!((params.output_width, params.output_height), (800, 450));
        assert!(!params.is_scaled());
    }

    #[test]
    fn test_5k_capture_selects_software_path() {
        let params = EncoderParams::for_region(&region(0, 0, 5120, 2880, CaptureMode::Region))
            .expect("valid region");
        assert!(params.is_scaled());
        assert_eq!((params.output_width, params.output_height), (4096, 2304));
        assert!(!params.quality.hardware);
        assert_eq!(params.quality.frame_rate, 24);
    }

    #[test]
    fn test_invalid_region_rejected() {
        let err = EncoderParams::for_region(&region(0, 0, 5, 400, CaptureMode::Region))
            .expect_err("too narrow");
        assert!(matches!(err, EncoderError::InvalidRegion(_)));
    }
}
