//! Global hotkeys
//!
//! Shortcut strings are parsed here; registration happens on the toolbar
//! window so `WM_HOTKEY` arrives on the UI thread.

use crate::config::HotkeyConfig;

// RegisterHotKey modifier bits.
pub const MOD_ALT: u32 = 0x0001;
pub const MOD_CONTROL: u32 = 0x0002;
pub const MOD_SHIFT: u32 = 0x0004;
pub const MOD_WIN: u32 = 0x0008;

/// Modifier bits and virtual-key code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub modifiers: u32,
    pub vk: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    StartStop,
    PauseResume,
    Cancel,
}

impl HotkeyAction {
    pub const ALL: [HotkeyAction; 3] = [
        HotkeyAction::StartStop,
        HotkeyAction::PauseResume,
        HotkeyAction::Cancel,
    ];

    /// Identifier passed to `RegisterHotKey` and echoed in `WM_HOTKEY`.
    pub fn id(&self) -> i32 {
        match self {
            HotkeyAction::StartStop => 1,
            HotkeyAction::PauseResume => 2,
            HotkeyAction::Cancel => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<HotkeyAction> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    pub fn shortcut_text<'a>(&self, config: &'a HotkeyConfig) -> &'a str {
        match self {
            HotkeyAction::StartStop => &config.start_stop,
            HotkeyAction::PauseResume => &config.pause_resume,
            HotkeyAction::Cancel => &config.cancel,
        }
    }
}

/// Parse `Ctrl+Shift+R` style text. A key is required and every part must
/// be recognised.
pub fn parse_shortcut(text: &str) -> Option<Shortcut> {
    let parts: Vec<String> = text
        .split('+')
        .map(|part| part.trim().to_ascii_lowercase())
        .collect();
    let (key, modifier_parts) = parts.split_last()?;

    let mut modifiers = 0;
    for part in modifier_parts {
        modifiers |= match part.as_str() {
            "ctrl" | "control" => MOD_CONTROL,
            "shift" => MOD_SHIFT,
            "alt" => MOD_ALT,
            "win" | "super" => MOD_WIN,
            _ => return None,
        };
    }

    let vk = key_code(key)?;
    Some(Shortcut { modifiers, vk })
}

fn key_code(key: &str) -> Option<u32> {
    let bytes = key.as_bytes();
    if bytes.len() == 1 && (bytes[0].is_ascii_alphanumeric()) {
        return Some(bytes[0].to_ascii_uppercase() as u32);
    }
    if let Some(n) = key.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
        return (1..=24).contains(&n).then_some(0x70 + n - 1);
    }

    let vk = match key {
        "space" => 0x20,
        "enter" | "return" => 0x0D,
        "tab" => 0x09,
        "escape" | "esc" => 0x1B,
        "insert" => 0x2D,
        "delete" => 0x2E,
        "home" => 0x24,
        "end" => 0x23,
        "pageup" => 0x21,
        "pagedown" => 0x22,
        "printscreen" => 0x2C,
        "pause" => 0x13,
        _ => return None,
    };
    Some(vk)
}

#[cfg(windows)]
pub use self::win::{register_all, unregister_all};

#[cfg(windows)]
mod win {
    use super::{parse_shortcut, HotkeyAction};
    use crate::config::HotkeyConfig;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_NOREPEAT,
    };

    /// Register every configured hotkey on `hwnd`. Returns how many were
    /// registered; failures are logged and skipped.
    pub fn register_all(hwnd: HWND, config: &HotkeyConfig) -> usize {
        let mut registered = 0;
        for action in HotkeyAction::ALL {
            let text = action.shortcut_text(config);
            let Some(shortcut) = parse_shortcut(text) else {
                log::warn!("Ignoring unparseable hotkey {:?} for {:?}", text, action);
                continue;
            };

            let modifiers = HOT_KEY_MODIFIERS(shortcut.modifiers | MOD_NOREPEAT.0);
            match unsafe { RegisterHotKey(hwnd, action.id(), modifiers, shortcut.vk) } {
                Ok(()) => {
                    log::info!("Registered hotkey {} for {:?}", text, action);
                    registered += 1;
                }
                Err(e) => log::warn!("Could not register hotkey {} for {:?}: {}", text, action, e),
            }
        }
        registered
    }

    pub fn unregister_all(hwnd: HWND) {
        for action in HotkeyAction::ALL {
            unsafe {
                let _ = UnregisterHotKey(hwnd, action.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_shortcuts() {
        assert_eq!(
            parse_shortcut("Ctrl+Shift+R"),
            Some(Shortcut { modifiers: MOD_CONTROL | MOD_SHIFT, vk: 'R' as u32 })
        );
        assert_eq!(
            parse_shortcut(" alt + f9 "),
            Some(Shortcut { modifiers: MOD_ALT, vk: 0x78 })
        );
        assert_eq!(parse_shortcut("Win+5"), Some(Shortcut { modifiers: MOD_WIN, vk: '5' as u32 }));
    }

    #[test]
    fn test_parse_rejects_unknown_parts() {
        assert_eq!(parse_shortcut(""), None);
        assert_eq!(parse_shortcut("Ctrl+"), None);
        assert_eq!(parse_shortcut("Hyper+R"), None);
        assert_eq!(parse_shortcut("Ctrl+Banana"), None);
        assert_eq!(parse_shortcut("F25"), None);
    }

    #[test]
    fn test_action_ids_round_trip() {
        for action in HotkeyAction::ALL {
            assert_eq!(HotkeyAction::from_id(action.id()), Some(action));
        }
        assert_eq!(HotkeyAction::from_id(0), None);
    }

    #[test]
    fn test_defaults_all_parse() {
        let config = HotkeyConfig::default();
        for action in HotkeyAction::ALL {
            assert!(
                parse_shortcut(action.shortcut_text(&config)).is_some(),
                "default for {:?} should parse",
                action
            );
        }
    }
}
