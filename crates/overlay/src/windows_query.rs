//! Top-level window queries for window selection

use crate::selection::WindowInfo;
use capture_wgc::Rect;
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
use windows::Win32::Graphics::Dwm::{DwmGetWindowAttribute, DWMWA_CLOAKED, DWMWA_EXTENDED_FRAME_BOUNDS};
use windows::Win32::System::Threading::GetCurrentProcessId;
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetAncestor, GetDesktopWindow, GetShellWindow, GetWindow, GetWindowLongW,
    GetWindowRect, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
    IsIconic, IsWindowVisible, GA_ROOT, GWL_EXSTYLE, GWL_STYLE, GW_OWNER, WS_DISABLED,
    WS_EX_TOOLWINDOW,
};

/// Smallest window worth offering as a target.
const MIN_WINDOW_SIZE: u32 = 50;

struct EnumContext {
    own_process: u32,
    desktop: HWND,
    shell: HWND,
    windows: Vec<WindowInfo>,
}

/// Visible top-level windows, front to back. Windows of this process, the
/// desktop and the shell are left out.
pub fn enumerate_windows() -> Vec<WindowInfo> {
    let mut ctx = unsafe {
        EnumContext {
            own_process: GetCurrentProcessId(),
            desktop: GetDesktopWindow(),
            shell: GetShellWindow(),
            windows: Vec::new(),
        }
    };

    unsafe {
        let _ = EnumWindows(
            Some(enum_window_callback),
            LPARAM(&mut ctx as *mut EnumContext as isize),
        );
    }

    log::debug!("Window snapshot: {} candidates", ctx.windows.len());
    ctx.windows
}

unsafe extern "system" fn enum_window_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let ctx = &mut *(lparam.0 as *mut EnumContext);

    if should_include_window(ctx, hwnd) {
        if let Some(rect) = window_bounds(hwnd) {
            if rect.width >= MIN_WINDOW_SIZE && rect.height >= MIN_WINDOW_SIZE {
                ctx.windows.push(WindowInfo {
                    hwnd: hwnd.0 as isize,
                    rect,
                    title: window_title(hwnd),
                });
            }
        }
    }

    BOOL(1) // Continue enumeration
}

unsafe fn should_include_window(ctx: &EnumContext, hwnd: HWND) -> bool {
    if hwnd == ctx.desktop || hwnd == ctx.shell {
        return false;
    }

    if !IsWindowVisible(hwnd).as_bool() || IsIconic(hwnd).as_bool() {
        return false;
    }

    let mut pid = 0u32;
    GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32));
    if pid == ctx.own_process {
        return false;
    }

    let style = GetWindowLongW(hwnd, GWL_STYLE) as u32;
    if style & WS_DISABLED.0 != 0 {
        return false;
    }

    let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE) as u32;
    if ex_style & WS_EX_TOOLWINDOW.0 != 0 {
        return false;
    }

    // Cloaked windows live on another virtual desktop
    let mut cloaked: u32 = 0;
    if DwmGetWindowAttribute(
        hwnd,
        DWMWA_CLOAKED,
        &mut cloaked as *mut _ as *mut _,
        std::mem::size_of::<u32>() as u32,
    )
    .is_ok()
        && cloaked != 0
    {
        return false;
    }

    if let Ok(owner) = GetWindow(hwnd, GW_OWNER) {
        if !owner.is_invalid() {
            return false;
        }
    }

    GetAncestor(hwnd, GA_ROOT) == hwnd
}

/// Visible bounds: DWM extended frame bounds (no drop shadow), else the
/// plain window rect.
pub fn window_bounds(hwnd: HWND) -> Option<Rect> {
    unsafe {
        let mut rect = RECT::default();
        let dwm = DwmGetWindowAttribute(
            hwnd,
            DWMWA_EXTENDED_FRAME_BOUNDS,
            &mut rect as *mut RECT as *mut _,
            std::mem::size_of::<RECT>() as u32,
        );
        if dwm.is_err() && GetWindowRect(hwnd, &mut rect).is_err() {
            return None;
        }
        Some(Rect::from_ltrb(rect.left, rect.top, rect.right, rect.bottom))
    }
}

pub fn window_title(hwnd: HWND) -> String {
    unsafe {
        let len = GetWindowTextLengthW(hwnd);
        if len <= 0 {
            return String::new();
        }
        let mut buf = vec![0u16; len as usize + 1];
        let copied = GetWindowTextW(hwnd, &mut buf);
        OsString::from_wide(&buf[..copied.max(0) as usize])
            .to_string_lossy()
            .into_owned()
    }
}
