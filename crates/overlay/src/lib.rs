//! Selection and border overlays for ScreenRec
//!
//! `selection` and `border` hold the platform-independent logic; the layered
//! Win32 windows that host them are only built on Windows.

pub mod border;
pub mod dpi;
pub mod selection;

#[cfg(windows)]
pub mod outline;
#[cfg(windows)]
pub mod render;
#[cfg(windows)]
pub mod window;
#[cfg(windows)]
pub mod windows_query;

pub use border::{BorderStyle, CaptureBorder};
pub use dpi::DpiScale;
pub use selection::{SelectionKey, SelectionMode, SelectionSession, WindowInfo};

#[cfg(windows)]
pub use outline::OutlineBorder;
#[cfg(windows)]
pub use window::OverlayWindow;

use capture_wgc::RecordingRegion;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Windows(#[from] windows::core::Error),

    #[error("Overlay window is already open")]
    Busy,
}

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Selection outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// User confirmed a region
    Selected(RecordingRegion),
    /// User cancelled
    Cancelled,
}
