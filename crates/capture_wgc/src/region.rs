//! Region handed from the selection overlay to the recording controller

use crate::Rect;

/// Regions must be strictly larger than this on both axes.
pub const MIN_REGION_SIZE: u32 = 10;

/// How the region was chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureMode {
    FullScreen,
    #[default]
    Region,
    Window,
}

impl CaptureMode {
    pub fn label(&self) -> &'static str {
        match self {
            CaptureMode::FullScreen => "Full screen",
            CaptureMode::Region => "Region",
            CaptureMode::Window => "Window",
        }
    }
}

/// Capture region in physical screen pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingRegion {
    pub rect: Rect,
    pub mode: CaptureMode,
    pub window_handle: Option<isize>,
    pub window_title: Option<String>,
}

impl RecordingRegion {
    pub fn new(rect: Rect, mode: CaptureMode) -> Self {
        Self {
            rect,
            mode,
            window_handle: None,
            window_title: None,
        }
    }

    pub fn for_window(rect: Rect, hwnd: isize, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            rect,
            mode: CaptureMode::Window,
            window_handle: Some(hwnd),
            window_title: (!title.is_empty()).then_some(title),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rect.width > MIN_REGION_SIZE && self.rect.height > MIN_REGION_SIZE
    }

    /// Short human description, e.g. "Region 1280x720".
    pub fn describe(&self) -> String {
        match (&self.mode, &self.window_title) {
            (CaptureMode::Window, Some(title)) => {
                format!("{} ({}x{})", title, self.rect.width, self.rect.height)
            }
            _ => format!(
                "{} {}x{}",
                self.mode.label(),
                self.rect.width,
                self.rect.height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_validity_threshold() {
        let ok = RecordingRegion::new(Rect::new(0, 0, 100, 100), CaptureMode::Region);
        assert!(ok.is_valid());

        let narrow = RecordingRegion::new(Rect::new(0, 0, 5, 100), CaptureMode::Region);
        assert!(!narrow.is_valid());

        let short = RecordingRegion::new(Rect::new(0, 0, 100, 5), CaptureMode::Region);
        assert!(!short.is_valid());

        let edge = RecordingRegion::new(Rect::new(0, 0, 10, 11), CaptureMode::Region);
        assert!(!edge.is_valid(), "10px is not strictly larger than the minimum");
    }

    #[test]
    fn test_window_region_drops_empty_title() {
        let region = RecordingRegion::for_window(Rect::new(0, 0, 800, 600), 42, "");
        assert_eq!(region.mode, CaptureMode::Window);
        assert_eq!(region.window_handle, Some(42));
        assert_eq!(region.window_title, None);
        assert_eq!(region.describe(), "Window 800x600");
    }

    #[test]
    fn test_describe_uses_window_title() {
        let region = RecordingRegion::for_window(Rect::new(0, 0, 800, 600), 7, "Notepad");
        assert_eq!(region.describe(), "Notepad (800x600)");
    }
}
