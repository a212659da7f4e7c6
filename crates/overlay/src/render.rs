//! GDI rendering for the selection overlay

use crate::selection::SelectionSession;
use capture_wgc::Rect;
use windows::Win32::Foundation::{COLORREF, HWND, RECT};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, CreatePen, CreateSolidBrush,
    DeleteDC, DeleteObject, EndPaint, FillRect, GetStockObject, Rectangle, SelectObject,
    SetBkMode, SetTextColor, TextOutW, HDC, NULL_BRUSH, PAINTSTRUCT, PS_DASH, PS_SOLID, SRCCOPY,
    TRANSPARENT,
};

const BACKDROP: COLORREF = COLORREF(0x00202020);
const HIGHLIGHT_FILL: COLORREF = COLORREF(0x00707070);
const HOVER_PEN: COLORREF = COLORREF(0x000088FF); // Orange
const SELECTION_PEN: COLORREF = COLORREF(0x0000FF00); // Green
const BAR_FILL: COLORREF = COLORREF(0x00333333);
const TEXT: COLORREF = COLORREF(0x00FFFFFF);
const BAR_HEIGHT: i32 = 32;

/// Paints a `SelectionSession` onto the overlay window
pub struct OverlayRenderer {
    bounds: Rect,
}

impl OverlayRenderer {
    /// `bounds` is the overlay window's rectangle in screen coordinates.
    pub fn new(bounds: Rect) -> Self {
        Self { bounds }
    }

    pub fn local_to_screen(&self, x: i32, y: i32) -> (i32, i32) {
        (x + self.bounds.x, y + self.bounds.y)
    }

    fn to_local(&self, rect: &Rect) -> RECT {
        RECT {
            left: rect.x - self.bounds.x,
            top: rect.y - self.bounds.y,
            right: rect.right() - self.bounds.x,
            bottom: rect.bottom() - self.bounds.y,
        }
    }

    /// Render to window through an off-screen buffer
    pub fn render(&self, hwnd: HWND, session: &SelectionSession) {
        unsafe {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);
            let (width, height) = (self.bounds.width as i32, self.bounds.height as i32);

            let mem = CreateCompatibleDC(hdc);
            let bitmap = CreateCompatibleBitmap(hdc, width, height);
            let old_bitmap = SelectObject(mem, bitmap);

            self.draw_backdrop(mem);
            if let Some(rect) = session.preview() {
                self.draw_selection(mem, &rect, session.is_confirming() || session.is_dragging());
            }
            self.draw_info_bar(mem, &session.prompt());

            let _ = BitBlt(hdc, 0, 0, width, height, mem, 0, 0, SRCCOPY);

            SelectObject(mem, old_bitmap);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem);
            let _ = EndPaint(hwnd, &ps);
        }
    }

    unsafe fn draw_backdrop(&self, hdc: HDC) {
        let brush = CreateSolidBrush(BACKDROP);
        let all = RECT {
            left: 0,
            top: 0,
            right: self.bounds.width as i32,
            bottom: self.bounds.height as i32,
        };
        FillRect(hdc, &all, brush);
        let _ = DeleteObject(brush);
    }

    unsafe fn draw_selection(&self, hdc: HDC, rect: &Rect, chosen: bool) {
        let local = self.to_local(rect);

        let fill = CreateSolidBrush(HIGHLIGHT_FILL);
        FillRect(hdc, &local, fill);
        let _ = DeleteObject(fill);

        let pen = if chosen {
            CreatePen(PS_DASH, 2, SELECTION_PEN)
        } else {
            CreatePen(PS_SOLID, 3, HOVER_PEN)
        };
        let old_pen = SelectObject(hdc, pen);
        let old_brush = SelectObject(hdc, GetStockObject(NULL_BRUSH));

        let _ = Rectangle(hdc, local.left, local.top, local.right, local.bottom);

        SelectObject(hdc, old_brush);
        SelectObject(hdc, old_pen);
        let _ = DeleteObject(pen);

        // Size label under the rectangle
        let size_text: Vec<u16> = format!("{}x{}", rect.width, rect.height).encode_utf16().collect();
        SetBkMode(hdc, TRANSPARENT);
        SetTextColor(hdc, TEXT);
        let _ = TextOutW(hdc, local.left + 4, local.bottom + 4, &size_text);
    }

    unsafe fn draw_info_bar(&self, hdc: HDC, prompt: &str) {
        // Top edge of the primary monitor
        let top = -self.bounds.y;
        let bar = RECT {
            left: 0,
            top,
            right: self.bounds.width as i32,
            bottom: top + BAR_HEIGHT,
        };
        let brush = CreateSolidBrush(BAR_FILL);
        FillRect(hdc, &bar, brush);
        let _ = DeleteObject(brush);

        let text: Vec<u16> = prompt.encode_utf16().collect();
        SetBkMode(hdc, TRANSPARENT);
        SetTextColor(hdc, TEXT);
        let _ = TextOutW(hdc, -self.bounds.x + 10, top + 8, &text);
    }
}
