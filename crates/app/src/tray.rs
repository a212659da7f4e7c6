//! System tray icon and context menu

use screenrec::MenuModel;
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{HWND, LPARAM, POINT, WPARAM};
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_MODIFY,
    NOTIFYICONDATAW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, LoadIconW, PostMessageW,
    SetForegroundWindow, TrackPopupMenu, IDI_APPLICATION, MF_GRAYED, MF_SEPARATOR, MF_STRING,
    TPM_BOTTOMALIGN, TPM_LEFTALIGN, WM_NULL, WM_USER,
};

/// Tray icon callback message
pub const WM_TRAYICON: u32 = WM_USER + 1;

const TIP_CAPACITY: usize = 127;

pub struct SystemTray {
    hwnd: HWND,
    nid: NOTIFYICONDATAW,
    visible: bool,
}

impl SystemTray {
    pub fn new(hwnd: HWND) -> Self {
        let mut nid = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: 1,
            uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
            uCallbackMessage: WM_TRAYICON,
            ..Default::default()
        };
        write_tip(&mut nid, "ScreenRec");

        Self {
            hwnd,
            nid,
            visible: false,
        }
    }

    pub fn show(&mut self) -> windows::core::Result<()> {
        if self.visible {
            return Ok(());
        }

        unsafe {
            self.nid.hIcon = LoadIconW(None, IDI_APPLICATION)?;
            Shell_NotifyIconW(NIM_ADD, &self.nid).ok()?;
        }
        self.visible = true;
        Ok(())
    }

    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &self.nid);
        }
        self.visible = false;
    }

    /// Tooltip follows the recording state.
    pub fn set_tooltip(&mut self, text: &str) {
        write_tip(&mut self.nid, text);
        if self.visible {
            unsafe {
                let _ = Shell_NotifyIconW(NIM_MODIFY, &self.nid);
            }
        }
    }

    /// Pop up the menu at the cursor. The chosen item arrives as
    /// `WM_COMMAND` with the action's command id.
    pub fn show_context_menu(&self, menu: &MenuModel) -> windows::core::Result<()> {
        unsafe {
            let popup = CreatePopupMenu()?;

            for (index, item) in menu.items.iter().enumerate() {
                // Separator before the Show/Exit group.
                if index > 0 && item.action == screenrec::MenuAction::Show {
                    let _ = AppendMenuW(popup, MF_SEPARATOR, 0, PCWSTR::null());
                }
                let flags = if item.enabled { MF_STRING } else { MF_STRING | MF_GRAYED };
                let _ = AppendMenuW(
                    popup,
                    flags,
                    item.action.command_id() as usize,
                    &HSTRING::from(item.action.label()),
                );
            }

            let mut pt = POINT::default();
            let _ = GetCursorPos(&mut pt);

            let _ = SetForegroundWindow(self.hwnd);
            let _ = TrackPopupMenu(
                popup,
                TPM_LEFTALIGN | TPM_BOTTOMALIGN,
                pt.x,
                pt.y,
                0,
                self.hwnd,
                None,
            );
            // Lets the menu close when the user clicks elsewhere.
            let _ = PostMessageW(self.hwnd, WM_NULL, WPARAM(0), LPARAM(0));

            let _ = DestroyMenu(popup);
        }
        Ok(())
    }
}

fn write_tip(nid: &mut NOTIFYICONDATAW, text: &str) {
    let wide: Vec<u16> = text.encode_utf16().take(TIP_CAPACITY).collect();
    nid.szTip = [0; 128];
    nid.szTip[..wide.len()].copy_from_slice(&wide);
}

impl Drop for SystemTray {
    fn drop(&mut self) {
        self.hide();
    }
}
