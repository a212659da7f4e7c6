//! Selection logic for full-screen, region and window selection
//!
//! `SelectionSession` is fed with input in physical screen coordinates. The
//! overlay window translates messages into these calls and paints
//! `preview()`; nothing here touches Win32.

use crate::SelectionOutcome;
use capture_wgc::{AspectRatioPreset, CaptureMode, Rect, RecordingRegion, MIN_REGION_SIZE};

/// Selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    FullScreen,
    Region,
    Window,
}

impl SelectionMode {
    pub fn capture_mode(&self) -> CaptureMode {
        match self {
            SelectionMode::FullScreen => CaptureMode::FullScreen,
            SelectionMode::Region => CaptureMode::Region,
            SelectionMode::Window => CaptureMode::Window,
        }
    }
}

/// Top-level window candidate, in z-order position of the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub hwnd: isize,
    pub rect: Rect,
    pub title: String,
}

impl WindowInfo {
    /// Check if point is inside window
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rect.contains(x, y)
    }
}

/// Keyboard input the session reacts to. Enter and Space both confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKey {
    Confirm,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Waiting,
    Dragging {
        anchor: (i32, i32),
        moved: bool,
        rect: Rect,
    },
    Confirming {
        rect: Rect,
        window: Option<WindowInfo>,
    },
}

/// One run of the selection overlay
#[derive(Debug, Clone)]
pub struct SelectionSession {
    mode: SelectionMode,
    preset: AspectRatioPreset,
    work_area: Rect,
    windows: Vec<WindowInfo>,
    step: Step,
    cursor: Option<(i32, i32)>,
    hover: Option<WindowInfo>,
    outcome: Option<SelectionOutcome>,
}

impl SelectionSession {
    /// Pointer travel before a press turns into a drag.
    pub const DRAG_THRESHOLD: i32 = 4;

    /// `work_area` is the physical full-screen rectangle; `windows` is a
    /// front-to-back snapshot of selectable top-level windows.
    pub fn new(
        mode: SelectionMode,
        preset: AspectRatioPreset,
        work_area: Rect,
        windows: Vec<WindowInfo>,
    ) -> Self {
        Self {
            mode,
            preset,
            work_area,
            windows,
            step: Step::Waiting,
            cursor: None,
            hover: None,
            outcome: None,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn preset(&self) -> &AspectRatioPreset {
        &self.preset
    }

    pub fn hovered_window(&self) -> Option<&WindowInfo> {
        self.hover.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.step, Step::Dragging { moved: true, .. })
    }

    pub fn is_confirming(&self) -> bool {
        matches!(self.step, Step::Confirming { .. })
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&SelectionOutcome> {
        self.outcome.as_ref()
    }

    pub fn take_outcome(&mut self) -> Option<SelectionOutcome> {
        self.outcome.take()
    }

    /// Window closed from outside (Alt+F4, WM_CLOSE). Keeps an earlier result.
    pub fn abort(&mut self) {
        if self.outcome.is_none() {
            self.outcome = Some(SelectionOutcome::Cancelled);
        }
    }

    pub fn mouse_down(&mut self, x: i32, y: i32) {
        if self.is_finished() {
            return;
        }
        self.cursor = Some((x, y));

        if let Step::Confirming { rect, window } = &self.step {
            let (rect, window) = (*rect, window.clone());
            self.confirm(rect, window);
            return;
        }

        match self.mode {
            SelectionMode::FullScreen => self.confirm(self.work_area, None),
            SelectionMode::Region => {
                self.step = Step::Dragging {
                    anchor: (x, y),
                    moved: false,
                    rect: Rect::new(x, y, 0, 0),
                };
            }
            SelectionMode::Window => {
                if let Some(window) = find_window_at(&self.windows, x, y).cloned() {
                    self.step = Step::Confirming {
                        rect: window.rect,
                        window: Some(window),
                    };
                }
            }
        }
    }

    pub fn mouse_move(&mut self, x: i32, y: i32) {
        if self.is_finished() {
            return;
        }
        self.cursor = Some((x, y));

        match (&mut self.step, self.mode) {
            (Step::Waiting, SelectionMode::Window) => {
                self.hover = find_window_at(&self.windows, x, y).cloned();
            }
            (Step::Dragging { anchor, moved, rect }, SelectionMode::Region) => {
                if !*moved {
                    let dx = (x - anchor.0).abs();
                    let dy = (y - anchor.1).abs();
                    *moved = dx >= Self::DRAG_THRESHOLD || dy >= Self::DRAG_THRESHOLD;
                }
                if *moved && self.preset.fixed_size.is_none() {
                    *rect = match self.preset.ratio {
                        Some(ratio) => constrain_to_aspect(*anchor, (x, y), ratio),
                        None => calc_selection_rect(anchor.0, anchor.1, x, y),
                    };
                }
            }
            _ => {}
        }
    }

    pub fn mouse_up(&mut self, x: i32, y: i32) {
        if self.is_finished() {
            return;
        }
        self.cursor = Some((x, y));

        let Step::Dragging { moved, rect, .. } = self.step else {
            return;
        };

        self.step = if let Some((width, height)) = self.preset.fixed_size {
            Step::Confirming {
                rect: centered_rect(x, y, width, height),
                window: None,
            }
        } else if moved && is_valid_selection(&rect) {
            Step::Confirming { rect, window: None }
        } else {
            Step::Waiting
        };
    }

    pub fn key(&mut self, key: SelectionKey) {
        if self.is_finished() {
            return;
        }

        match key {
            SelectionKey::Confirm => match &self.step {
                Step::Confirming { rect, window } => {
                    let (rect, window) = (*rect, window.clone());
                    self.confirm(rect, window);
                }
                _ if self.mode == SelectionMode::FullScreen => {
                    self.confirm(self.work_area, None)
                }
                Step::Waiting if self.mode == SelectionMode::Window => {
                    if let Some(window) = self.hover.clone() {
                        self.step = Step::Confirming {
                            rect: window.rect,
                            window: Some(window),
                        };
                    }
                }
                _ => {}
            },
            SelectionKey::Escape => match self.step {
                Step::Waiting => self.outcome = Some(SelectionOutcome::Cancelled),
                Step::Dragging { .. } | Step::Confirming { .. } => {
                    log::debug!("Selection step cancelled");
                    self.step = Step::Waiting;
                }
            },
        }
    }

    /// Rectangle to highlight right now, if any.
    pub fn preview(&self) -> Option<Rect> {
        match &self.step {
            Step::Confirming { rect, .. } => Some(*rect),
            Step::Dragging { moved: true, rect, .. } if !rect.is_empty() => Some(*rect),
            _ => match self.mode {
                SelectionMode::FullScreen => Some(self.work_area),
                SelectionMode::Window => self.hover.as_ref().map(|w| w.rect),
                SelectionMode::Region => {
                    let (width, height) = self.preset.fixed_size?;
                    let (x, y) = self.cursor?;
                    Some(centered_rect(x, y, width, height))
                }
            },
        }
    }

    /// Instruction line shown on the overlay.
    pub fn prompt(&self) -> String {
        if self.is_finished() {
            return String::new();
        }

        match &self.step {
            Step::Confirming { rect, window } => {
                let target = match window {
                    Some(w) if !w.title.is_empty() => format!("\"{}\" ", w.title),
                    _ => String::new(),
                };
                format!(
                    "Record {}{}x{}? Click, Enter or Space to start | Esc to go back",
                    target, rect.width, rect.height
                )
            }
            Step::Dragging { moved: true, rect, .. } => {
                format!("{}x{} | Release to set the region", rect.width, rect.height)
            }
            _ => match self.mode {
                SelectionMode::FullScreen => format!(
                    "Full screen {}x{} | Click, Enter or Space to start | Esc to cancel",
                    self.work_area.width, self.work_area.height
                ),
                SelectionMode::Region => match self.preset.fixed_size {
                    Some((w, h)) => format!(
                        "Click to place a {} ({}x{}) region | Esc to cancel",
                        self.preset.name, w, h
                    ),
                    None => format!("Drag to select a region ({}) | Esc to cancel", self.preset.name),
                },
                SelectionMode::Window => match &self.hover {
                    Some(w) => format!(
                        "{} {}x{} | Click to select | Esc to cancel",
                        w.title, w.rect.width, w.rect.height
                    ),
                    None => "Point at a window | Esc to cancel".to_string(),
                },
            },
        }
    }

    fn confirm(&mut self, rect: Rect, window: Option<WindowInfo>) {
        let region = match window {
            Some(w) => RecordingRegion::for_window(rect, w.hwnd, w.title),
            None => RecordingRegion::new(rect, self.mode.capture_mode()),
        };
        log::info!("Selection confirmed: {}", region.describe());
        self.outcome = Some(SelectionOutcome::Selected(region));
    }
}

/// Find window at screen coordinates (snapshot is already front-to-back)
pub fn find_window_at(windows: &[WindowInfo], screen_x: i32, screen_y: i32) -> Option<&WindowInfo> {
    windows.iter().find(|w| w.contains(screen_x, screen_y))
}

/// Calculate selection rectangle from drag points
pub fn calc_selection_rect(start_x: i32, start_y: i32, end_x: i32, end_y: i32) -> Rect {
    let x = start_x.min(end_x);
    let y = start_y.min(end_y);
    let width = (start_x - end_x).unsigned_abs();
    let height = (start_y - end_y).unsigned_abs();

    Rect::new(x, y, width, height)
}

/// Drag rectangle from `anchor` toward `cursor`, shrinking whichever axis is
/// too long for `ratio` (width, height). Integer division truncates.
pub fn constrain_to_aspect(anchor: (i32, i32), cursor: (i32, i32), ratio: (u32, u32)) -> Rect {
    let (rw, rh) = (ratio.0.max(1) as u64, ratio.1.max(1) as u64);
    let mut width = (cursor.0 - anchor.0).unsigned_abs() as u64;
    let mut height = (cursor.1 - anchor.1).unsigned_abs() as u64;

    if width * rh > height * rw {
        width = height * rw / rh;
    } else {
        height = width * rh / rw;
    }

    // Keep the rectangle on the side of the anchor the cursor is on.
    let x = if cursor.0 >= anchor.0 { anchor.0 } else { anchor.0 - width as i32 };
    let y = if cursor.1 >= anchor.1 { anchor.1 } else { anchor.1 - height as i32 };

    Rect::new(x, y, width as u32, height as u32)
}

/// `width` x `height` rectangle centred on a point
pub fn centered_rect(x: i32, y: i32, width: u32, height: u32) -> Rect {
    Rect::new(x - (width / 2) as i32, y - (height / 2) as i32, width, height)
}

/// Check if selection is large enough to record
pub fn is_valid_selection(rect: &Rect) -> bool {
    rect.width > MIN_REGION_SIZE && rect.height > MIN_REGION_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_wgc::PRESETS;

    fn preset(name: &str) -> AspectRatioPreset {
        *AspectRatioPreset::find(name).expect("known preset")
    }

    fn work_area() -> Rect {
        Rect::new(0, 0, 1920, 1040)
    }

    fn snapshot() -> Vec<WindowInfo> {
        vec![
            WindowInfo {
                hwnd: 0x100,
                rect: Rect::new(100, 100, 400, 300),
                title: "Editor".into(),
            },
            WindowInfo {
                hwnd: 0x200,
                rect: Rect::new(0, 0, 1000, 800),
                title: "Browser".into(),
            },
        ]
    }

    fn drag(session: &mut SelectionSession, from: (i32, i32), to: (i32, i32)) {
        session.mouse_down(from.0, from.1);
        session.mouse_move(to.0, to.1);
        session.mouse_up(to.0, to.1);
    }

    fn selected(session: &SelectionSession) -> RecordingRegion {
        match session.outcome() {
            Some(SelectionOutcome::Selected(region)) => region.clone(),
            other => panic!("expected a selection, got {:?}", other),
        }
    }

    #[test]
    fn test_constrain_16_9_from_width_400() {
        let rect = constrain_to_aspect((0, 0), (400, 300), (16, 9));
        assert_eq!((rect.width, rect.height), (400, 225));
    }

    #[test]
    fn test_constrain_shrinks_wide_drag() {
        let rect = constrain_to_aspect((0, 0), (400, 90), (16, 9));
        assert_eq!((rect.width, rect.height), (160, 90));
    }

    #[test]
    fn test_constrain_keeps_anchor_when_dragging_up_left() {
        let rect = constrain_to_aspect((500, 500), (100, 100), (1, 1));
        assert_eq!(rect, Rect::new(100, 100, 400, 400));

        let rect = constrain_to_aspect((500, 500), (100, 400), (4, 3));
        // 400x100 is too wide: width shrinks to 133, height stays 100.
        assert_eq!(rect, Rect::new(367, 400, 133, 100));
    }

    #[test]
    fn test_calc_selection_rect_normalizes() {
        assert_eq!(calc_selection_rect(50, 80, 10, 20), Rect::new(10, 20, 40, 60));
    }

    #[test]
    fn test_region_drag_then_confirm_click() {
        let mut session = SelectionSession::new(SelectionMode::Region, PRESETS[0], work_area(), vec![]);
        drag(&mut session, (10, 20), (310, 220));

        assert!(session.is_confirming(), "drag should wait for confirmation");
        assert!(!session.is_finished());
        assert_eq!(session.preview(), Some(Rect::new(10, 20, 300, 200)));
        assert!(session.prompt().contains("300x200"));

        session.mouse_down(50, 50);
        let region = selected(&session);
        assert_eq!(region.rect, Rect::new(10, 20, 300, 200));
        assert_eq!(region.mode, CaptureMode::Region);
    }

    #[test]
    fn test_region_drag_with_ratio_preset() {
        let mut session = SelectionSession::new(SelectionMode::Region, preset("16:9"), work_area(), vec![]);
        drag(&mut session, (0, 0), (400, 300));
        session.key(SelectionKey::Confirm);

        assert_eq!(selected(&session).rect, Rect::new(0, 0, 400, 225));
    }

    #[test]
    fn test_tiny_drag_returns_to_waiting() {
        let mut session = SelectionSession::new(SelectionMode::Region, PRESETS[0], work_area(), vec![]);
        drag(&mut session, (10, 10), (18, 15));

        assert!(!session.is_confirming());
        assert!(!session.is_finished());
        assert_eq!(session.preview(), None);
    }

    #[test]
    fn test_fixed_preset_click_places_centered() {
        let mut session = SelectionSession::new(SelectionMode::Region, preset("720p"), work_area(), vec![]);
        session.mouse_move(960, 520);
        assert_eq!(session.preview(), Some(Rect::new(320, 160, 1280, 720)));

        session.mouse_down(960, 520);
        session.mouse_up(960, 520);
        assert!(session.is_confirming());

        session.key(SelectionKey::Confirm);
        assert_eq!(selected(&session).rect, Rect::new(320, 160, 1280, 720));
    }

    #[test]
    fn test_escape_backs_out_one_step_at_a_time() {
        let mut session = SelectionSession::new(SelectionMode::Region, PRESETS[0], work_area(), vec![]);
        drag(&mut session, (0, 0), (200, 200));
        assert!(session.is_confirming());

        session.key(SelectionKey::Escape);
        assert!(!session.is_confirming());
        assert!(!session.is_finished(), "first escape only leaves the confirmation");

        session.mouse_down(0, 0);
        session.mouse_move(100, 100);
        session.key(SelectionKey::Escape);
        assert!(!session.is_dragging());
        assert!(!session.is_finished(), "escape during a drag drops the drag");

        session.key(SelectionKey::Escape);
        assert_eq!(session.outcome(), Some(&SelectionOutcome::Cancelled));
    }

    #[test]
    fn test_full_screen_confirms_work_area() {
        let mut session = SelectionSession::new(SelectionMode::FullScreen, PRESETS[0], work_area(), vec![]);
        assert_eq!(session.preview(), Some(work_area()));

        session.key(SelectionKey::Confirm);
        let region = selected(&session);
        assert_eq!(region.rect, work_area());
        assert_eq!(region.mode, CaptureMode::FullScreen);
    }

    #[test]
    fn test_full_screen_click_confirms_and_escape_cancels() {
        let mut clicked = SelectionSession::new(SelectionMode::FullScreen, PRESETS[0], work_area(), vec![]);
        clicked.mouse_down(5, 5);
        assert!(clicked.is_finished());

        let mut cancelled = SelectionSession::new(SelectionMode::FullScreen, PRESETS[0], work_area(), vec![]);
        cancelled.key(SelectionKey::Escape);
        assert_eq!(cancelled.take_outcome(), Some(SelectionOutcome::Cancelled));
    }

    #[test]
    fn test_window_hover_picks_frontmost() {
        let mut session = SelectionSession::new(SelectionMode::Window, PRESETS[0], work_area(), snapshot());

        session.mouse_move(200, 200);
        assert_eq!(session.hovered_window().map(|w| w.hwnd), Some(0x100));

        session.mouse_move(900, 700);
        assert_eq!(session.hovered_window().map(|w| w.hwnd), Some(0x200));

        session.mouse_move(1500, 900);
        assert!(session.hovered_window().is_none());
        assert_eq!(session.preview(), None);
    }

    #[test]
    fn test_window_click_needs_confirmation() {
        let mut session = SelectionSession::new(SelectionMode::Window, PRESETS[0], work_area(), snapshot());
        session.mouse_move(200, 200);
        session.mouse_down(200, 200);

        assert!(session.is_confirming());
        assert!(session.prompt().contains("\"Editor\" 400x300"));

        session.key(SelectionKey::Confirm);
        let region = selected(&session);
        assert_eq!(region.mode, CaptureMode::Window);
        assert_eq!(region.window_handle, Some(0x100));
        assert_eq!(region.window_title.as_deref(), Some("Editor"));
        assert_eq!(region.rect, Rect::new(100, 100, 400, 300));
    }

    #[test]
    fn test_click_on_empty_desktop_selects_nothing() {
        let mut session = SelectionSession::new(SelectionMode::Window, PRESETS[0], work_area(), snapshot());
        session.mouse_down(1500, 900);
        assert!(!session.is_confirming());
        assert!(!session.is_finished());
    }

    #[test]
    fn test_input_after_finish_is_ignored() {
        let mut session = SelectionSession::new(SelectionMode::FullScreen, PRESETS[0], work_area(), vec![]);
        session.key(SelectionKey::Confirm);
        session.key(SelectionKey::Escape);
        session.abort();

        assert!(matches!(session.outcome(), Some(SelectionOutcome::Selected(_))));
    }
}
