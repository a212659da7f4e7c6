//! Selection overlay window
//!
//! A layered, semi-transparent popup over the whole virtual desktop. Mouse and
//! key messages are forwarded to a `SelectionSession`; the window closes as
//! soon as the session has an outcome.

use crate::{
    dpi,
    render::OverlayRenderer,
    selection::{SelectionKey, SelectionMode, SelectionSession},
    windows_query, OverlayError, OverlayResult, SelectionOutcome,
};
use capture_wgc::{AspectRatioPreset, Rect};
use std::cell::RefCell;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{InvalidateRect, UpdateWindow};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{SetFocus, VK_ESCAPE, VK_RETURN, VK_SPACE};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    GetSystemMetrics, LoadCursorW, RegisterClassExW, SetForegroundWindow,
    SetLayeredWindowAttributes, ShowWindow, TranslateMessage, CS_HREDRAW, CS_VREDRAW, IDC_CROSS,
    LWA_ALPHA, MSG, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN, SW_SHOW, WM_CLOSE, WM_DESTROY, WM_ERASEBKGND, WM_KEYDOWN,
    WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEMOVE, WM_PAINT, WM_RBUTTONDOWN, WNDCLASSEXW,
    WS_EX_LAYERED, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_POPUP,
};

/// Overall overlay opacity (0-255)
const OVERLAY_ALPHA: u8 = 110;

thread_local! {
    static OVERLAY_STATE: RefCell<Option<OverlayState>> = const { RefCell::new(None) };
}

struct OverlayState {
    renderer: OverlayRenderer,
    session: SelectionSession,
}

fn virtual_desktop_rect() -> Rect {
    unsafe {
        Rect::new(
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN).max(0) as u32,
            GetSystemMetrics(SM_CYVIRTUALSCREEN).max(0) as u32,
        )
    }
}

fn lparam_point(lparam: LPARAM) -> (i32, i32) {
    let x = (lparam.0 & 0xFFFF) as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
    (x, y)
}

/// Overlay window for selection
pub struct OverlayWindow;

impl OverlayWindow {
    const CLASS_NAME: PCWSTR = w!("ScreenRecSelectionOverlay");

    /// Show the overlay and block in a nested message loop until the user
    /// confirms or cancels.
    pub fn show(mode: SelectionMode, preset: AspectRatioPreset) -> OverlayResult<SelectionOutcome> {
        let busy = OVERLAY_STATE.with(|s| s.borrow().is_some());
        if busy {
            return Err(OverlayError::Busy);
        }

        let bounds = virtual_desktop_rect();
        let work_area = dpi::primary_work_area()?;
        let windows = match mode {
            SelectionMode::Window => windows_query::enumerate_windows(),
            _ => Vec::new(),
        };
        log::info!("Selection overlay opened ({:?}, preset {})", mode, preset.name);

        OVERLAY_STATE.with(|s| {
            *s.borrow_mut() = Some(OverlayState {
                renderer: OverlayRenderer::new(bounds),
                session: SelectionSession::new(mode, preset, work_area, windows),
            });
        });

        let result = unsafe { Self::run(bounds) };

        let outcome = OVERLAY_STATE.with(|s| {
            s.borrow_mut()
                .take()
                .and_then(|mut state| state.session.take_outcome())
        });

        result?;
        Ok(outcome.unwrap_or(SelectionOutcome::Cancelled))
    }

    unsafe fn run(bounds: Rect) -> OverlayResult<()> {
        let hmodule = GetModuleHandleW(None)?;
        let hinstance = HINSTANCE(hmodule.0);

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(Self::wnd_proc),
            hInstance: hinstance,
            hCursor: LoadCursorW(None, IDC_CROSS)?,
            lpszClassName: Self::CLASS_NAME,
            ..Default::default()
        };
        RegisterClassExW(&wc);

        let hwnd = CreateWindowExW(
            WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
            Self::CLASS_NAME,
            w!("ScreenRec Selection"),
            WS_POPUP,
            bounds.x,
            bounds.y,
            bounds.width as i32,
            bounds.height as i32,
            None,
            None,
            hinstance,
            None,
        )?;

        SetLayeredWindowAttributes(hwnd, COLORREF(0), OVERLAY_ALPHA, LWA_ALPHA)?;
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
        let _ = SetFocus(hwnd);
        let _ = UpdateWindow(hwnd);

        let mut msg = MSG::default();
        loop {
            let ret = GetMessageW(&mut msg, None, 0, 0);
            if !ret.as_bool() {
                break;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);

            if Self::is_finished() {
                break;
            }
        }

        let _ = DestroyWindow(hwnd);
        Ok(())
    }

    fn is_finished() -> bool {
        OVERLAY_STATE.with(|s| {
            s.borrow()
                .as_ref()
                .map(|state| state.session.is_finished())
                .unwrap_or(true)
        })
    }

    /// Run `f` against the session and repaint.
    fn with_session(hwnd: HWND, lparam: Option<LPARAM>, f: impl FnOnce(&mut SelectionSession, i32, i32)) {
        OVERLAY_STATE.with(|s| {
            if let Some(state) = s.borrow_mut().as_mut() {
                let (x, y) = lparam
                    .map(|l| {
                        let (x, y) = lparam_point(l);
                        state.renderer.local_to_screen(x, y)
                    })
                    .unwrap_or_default();
                f(&mut state.session, x, y);
            }
        });
        unsafe {
            let _ = InvalidateRect(hwnd, None, false);
        }
    }

    unsafe extern "system" fn wnd_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_PAINT => {
                OVERLAY_STATE.with(|s| {
                    if let Some(state) = s.borrow().as_ref() {
                        state.renderer.render(hwnd, &state.session);
                    }
                });
                LRESULT(0)
            }

            WM_ERASEBKGND => LRESULT(1),

            WM_LBUTTONDOWN => {
                Self::with_session(hwnd, Some(lparam), |session, x, y| session.mouse_down(x, y));
                LRESULT(0)
            }

            WM_MOUSEMOVE => {
                Self::with_session(hwnd, Some(lparam), |session, x, y| session.mouse_move(x, y));
                LRESULT(0)
            }

            WM_LBUTTONUP => {
                Self::with_session(hwnd, Some(lparam), |session, x, y| session.mouse_up(x, y));
                LRESULT(0)
            }

            // Right click behaves like Escape
            WM_RBUTTONDOWN => {
                Self::with_session(hwnd, None, |session, _, _| session.key(SelectionKey::Escape));
                LRESULT(0)
            }

            WM_KEYDOWN => {
                let key = match wparam.0 as u16 {
                    k if k == VK_ESCAPE.0 => Some(SelectionKey::Escape),
                    k if k == VK_RETURN.0 || k == VK_SPACE.0 => Some(SelectionKey::Confirm),
                    _ => None,
                };
                if let Some(key) = key {
                    Self::with_session(hwnd, None, |session, _, _| session.key(key));
                }
                LRESULT(0)
            }

            WM_CLOSE => {
                OVERLAY_STATE.with(|s| {
                    if let Some(state) = s.borrow_mut().as_mut() {
                        state.session.abort();
                    }
                });
                LRESULT(0)
            }

            WM_DESTROY => LRESULT(0),

            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}
