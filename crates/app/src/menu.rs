//! Toolbar and tray menu projection
//!
//! Both surfaces are rebuilt from `render_menu` after every transition rather
//! than being toggled one control at a time.

use crate::state::RecordingState;

/// User-facing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    FullScreen,
    Region,
    Window,
    Pause,
    Resume,
    Stop,
    Cancel,
    Restart,
    Show,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 10] = [
        MenuAction::FullScreen,
        MenuAction::Region,
        MenuAction::Window,
        MenuAction::Pause,
        MenuAction::Resume,
        MenuAction::Stop,
        MenuAction::Cancel,
        MenuAction::Restart,
        MenuAction::Show,
        MenuAction::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::FullScreen => "Full Screen",
            MenuAction::Region => "Region",
            MenuAction::Window => "Window",
            MenuAction::Pause => "Pause",
            MenuAction::Resume => "Resume",
            MenuAction::Stop => "Stop",
            MenuAction::Cancel => "Cancel",
            MenuAction::Restart => "Restart",
            MenuAction::Show => "Show Toolbar",
            MenuAction::Exit => "Exit",
        }
    }

    /// `WM_COMMAND` identifier shared by toolbar buttons and tray items.
    pub fn command_id(&self) -> u16 {
        1001 + Self::ALL.iter().position(|a| a == self).unwrap_or(0) as u16
    }

    pub fn from_command_id(id: u16) -> Option<MenuAction> {
        id.checked_sub(1001)
            .and_then(|index| Self::ALL.get(index as usize).copied())
    }

    pub fn starts_capture(&self) -> bool {
        matches!(self, MenuAction::FullScreen | MenuAction::Region | MenuAction::Window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub action: MenuAction,
    pub enabled: bool,
}

/// Visible items in display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuModel {
    pub items: Vec<MenuItem>,
}

impl MenuModel {
    fn push(&mut self, action: MenuAction, enabled: bool) {
        self.items.push(MenuItem { action, enabled });
    }

    pub fn is_visible(&self, action: MenuAction) -> bool {
        self.items.iter().any(|item| item.action == action)
    }

    pub fn is_enabled(&self, action: MenuAction) -> bool {
        self.items
            .iter()
            .any(|item| item.action == action && item.enabled)
    }
}

pub fn render_menu(state: RecordingState, paused: bool) -> MenuModel {
    let mut menu = MenuModel::default();

    match state {
        RecordingState::Idle | RecordingState::Selecting => {
            let idle = state == RecordingState::Idle;
            menu.push(MenuAction::FullScreen, idle);
            menu.push(MenuAction::Region, idle);
            menu.push(MenuAction::Window, idle);
        }
        RecordingState::Recording => {
            if paused {
                menu.push(MenuAction::Resume, true);
            } else {
                menu.push(MenuAction::Pause, true);
            }
            menu.push(MenuAction::Stop, true);
            menu.push(MenuAction::Cancel, true);
            menu.push(MenuAction::Restart, true);
        }
        RecordingState::Stopping => {
            menu.push(MenuAction::Stop, false);
            menu.push(MenuAction::Cancel, false);
        }
    }

    menu.push(MenuAction::Show, true);
    // Quitting mid-finalize would lose the file
    menu.push(MenuAction::Exit, state != RecordingState::Stopping);
    menu
}
