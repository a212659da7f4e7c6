//! Recording outline overlay (topmost, click-through, hidden from capture).

use crate::border::{border_frame, edge_rects, to_colorref, BorderStyle, CaptureBorder};
use crate::OverlayResult;
use capture_wgc::Rect;
use std::sync::Once;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateSolidBrush, DeleteObject, EndPaint, FillRect, InvalidateRect,
    PAINTSTRUCT, UpdateWindow,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect, GetWindowLongPtrW, KillTimer,
    RegisterClassExW, SetLayeredWindowAttributes, SetTimer, SetWindowDisplayAffinity,
    SetWindowLongPtrW, SetWindowPos, ShowWindow, GWLP_USERDATA, HTTRANSPARENT, HWND_NOTOPMOST,
    HWND_TOPMOST, LWA_COLORKEY, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SW_SHOWNOACTIVATE,
    WDA_EXCLUDEFROMCAPTURE, WM_NCHITTEST, WM_PAINT, WM_TIMER, WNDCLASSEXW, WS_EX_LAYERED,
    WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};

const OUTLINE_CLASS: PCWSTR = w!("ScreenRecCaptureBorder");

/// Interior fill; keyed out so the captured area shows through.
const KEY_COLOR: u32 = 0x00FF00FF;

const TOPMOST_TIMER_ID: usize = 1;
const TOPMOST_INTERVAL_MS: u32 = 1000;

static REGISTER: Once = Once::new();

fn register_class(hinstance: HINSTANCE) {
    REGISTER.call_once(|| unsafe {
        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(outline_wnd_proc),
            hInstance: hinstance,
            lpszClassName: OUTLINE_CLASS,
            ..Default::default()
        };

        let _ = RegisterClassExW(&wc);
    });
}

/// Paint parameters read by the window procedure through `GWLP_USERDATA`.
struct OutlinePaint {
    colorref: u32,
    thickness: u32,
}

/// Win32 implementation of the capture border
pub struct OutlineBorder {
    style: BorderStyle,
    hwnd: isize,
    paint: Box<OutlinePaint>,
}

impl OutlineBorder {
    pub fn new(style: BorderStyle) -> Self {
        Self {
            style,
            hwnd: 0,
            paint: Box::new(OutlinePaint {
                colorref: to_colorref(style.color),
                thickness: style.thickness,
            }),
        }
    }

    fn hwnd(&self) -> HWND {
        HWND(self.hwnd as *mut std::ffi::c_void)
    }
}

impl CaptureBorder for OutlineBorder {
    fn show(&mut self, capture: Rect) -> OverlayResult<()> {
        self.close();

        let frame = border_frame(capture, self.style.thickness);
        self.paint.colorref = to_colorref(self.style.color);
        self.paint.thickness = self.style.thickness;

        unsafe {
            let hmodule = GetModuleHandleW(None)?;
            let hinstance = HINSTANCE(hmodule.0);
            register_class(hinstance);

            let hwnd = CreateWindowExW(
                WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_TRANSPARENT | WS_EX_NOACTIVATE,
                OUTLINE_CLASS,
                w!("ScreenRec Recording"),
                WS_POPUP,
                frame.x,
                frame.y,
                frame.width as i32,
                frame.height as i32,
                None,
                None,
                hinstance,
                None,
            )?;
            self.hwnd = hwnd.0 as isize;

            SetWindowLongPtrW(hwnd, GWLP_USERDATA, &*self.paint as *const OutlinePaint as isize);
            SetLayeredWindowAttributes(hwnd, COLORREF(KEY_COLOR), 0, LWA_COLORKEY)?;

            if let Err(e) = SetWindowDisplayAffinity(hwnd, WDA_EXCLUDEFROMCAPTURE) {
                // Older builds: the border will show up in the recording.
                log::warn!("Could not exclude border from capture: {}", e);
            }

            SetTimer(hwnd, TOPMOST_TIMER_ID, TOPMOST_INTERVAL_MS, None);

            let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
            let _ = UpdateWindow(hwnd);
        }

        log::debug!("Border shown at {:?}", frame);
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) {
        self.paint.colorref = to_colorref(self.style.color_for(paused));
        if self.hwnd != 0 {
            unsafe {
                let _ = InvalidateRect(self.hwnd(), None, true);
            }
        }
    }

    fn close(&mut self) {
        if self.hwnd == 0 {
            return;
        }

        let hwnd = self.hwnd();
        self.hwnd = 0;
        unsafe {
            let _ = KillTimer(hwnd, TOPMOST_TIMER_ID);
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            let _ = DestroyWindow(hwnd);
        }
        log::debug!("Border closed");
    }

    fn is_visible(&self) -> bool {
        self.hwnd != 0
    }
}

impl Drop for OutlineBorder {
    fn drop(&mut self) {
        self.close();
    }
}

unsafe extern "system" fn outline_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_NCHITTEST => LRESULT(HTTRANSPARENT as isize),
        WM_TIMER if wparam.0 == TOPMOST_TIMER_ID => {
            // Other topmost windows can get above us; bounce the flag.
            let flags = SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE;
            let _ = SetWindowPos(hwnd, HWND_NOTOPMOST, 0, 0, 0, 0, flags);
            let _ = SetWindowPos(hwnd, HWND_TOPMOST, 0, 0, 0, 0, flags);
            LRESULT(0)
        }
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);

            let mut client = RECT::default();
            let _ = GetClientRect(hwnd, &mut client);

            let key = CreateSolidBrush(COLORREF(KEY_COLOR));
            FillRect(hdc, &client, key);
            let _ = DeleteObject(key);

            let paint = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const OutlinePaint;
            if let Some(paint) = paint.as_ref() {
                let brush = CreateSolidBrush(COLORREF(paint.colorref));
                let width = (client.right - client.left).max(0) as u32;
                let height = (client.bottom - client.top).max(0) as u32;
                for edge in edge_rects(width, height, paint.thickness) {
                    let bar = RECT {
                        left: edge.x,
                        top: edge.y,
                        right: edge.right(),
                        bottom: edge.bottom(),
                    };
                    FillRect(hdc, &bar, brush);
                }
                let _ = DeleteObject(brush);
            }

            let _ = EndPaint(hwnd, &ps);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
