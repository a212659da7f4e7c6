//! Logical to physical pixel conversion

use capture_wgc::Rect;

/// Per-axis scale factor relative to 96 DPI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DpiScale {
    pub x: f64,
    pub y: f64,
}

impl DpiScale {
    pub const IDENTITY: DpiScale = DpiScale { x: 1.0, y: 1.0 };

    pub fn from_dpi(dpi_x: u32, dpi_y: u32) -> Self {
        Self {
            x: dpi_x.max(1) as f64 / 96.0,
            y: dpi_y.max(1) as f64 / 96.0,
        }
    }
}

impl Default for DpiScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Multiply logical bounds by the scale on each axis.
pub fn to_physical(logical: Rect, scale: DpiScale) -> Rect {
    Rect::from_ltrb(
        (logical.x as f64 * scale.x).round() as i32,
        (logical.y as f64 * scale.y).round() as i32,
        (logical.right() as f64 * scale.x).round() as i32,
        (logical.bottom() as f64 * scale.y).round() as i32,
    )
}

/// Work area of the primary monitor (taskbar excluded) in physical pixels.
#[cfg(windows)]
pub fn primary_work_area() -> crate::OverlayResult<Rect> {
    use windows::Win32::Foundation::{POINT, RECT};
    use windows::Win32::Graphics::Gdi::{MonitorFromPoint, MONITOR_DEFAULTTOPRIMARY};
    use windows::Win32::UI::HiDpi::{
        GetAwarenessFromDpiAwarenessContext, GetDpiForMonitor, GetThreadDpiAwarenessContext,
        DPI_AWARENESS_UNAWARE, MDT_EFFECTIVE_DPI,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        SystemParametersInfoW, SPI_GETWORKAREA, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS,
    };

    unsafe {
        let mut area = RECT::default();
        SystemParametersInfoW(
            SPI_GETWORKAREA,
            0,
            Some(&mut area as *mut RECT as *mut _),
            SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
        )?;
        let logical = Rect::from_ltrb(area.left, area.top, area.right, area.bottom);

        // A DPI-aware thread already sees physical pixels.
        let awareness = GetAwarenessFromDpiAwarenessContext(GetThreadDpiAwarenessContext());
        let scale = if awareness == DPI_AWARENESS_UNAWARE {
            let monitor = MonitorFromPoint(POINT { x: 0, y: 0 }, MONITOR_DEFAULTTOPRIMARY);
            let (mut dpi_x, mut dpi_y) = (96u32, 96u32);
            GetDpiForMonitor(monitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y)?;
            DpiScale::from_dpi(dpi_x, dpi_y)
        } else {
            DpiScale::IDENTITY
        };

        let physical = to_physical(logical, scale);
        log::debug!("Primary work area {:?} x {:?} -> {:?}", logical, scale, physical);
        Ok(physical)
    }
}
