//! Toolbar window
//!
//! Buttons, tray menu and timers are projections of the controller state and
//! are rebuilt by `refresh` after every transition. The controller lives in
//! `UI_STATE`; the lock is never held across the selection overlay or a
//! modal dialog, both of which pump messages back into `wnd_proc`.

use crate::tray::{SystemTray, WM_TRAYICON};
use capture_wgc::{AspectRatioPreset, PRESETS};
use crossbeam_channel::{unbounded, Receiver, Sender};
use encoder::TranscoderFactory;
use once_cell::sync::OnceCell;
use overlay::{OutlineBorder, OverlayWindow, SelectionMode, SelectionOutcome};
use parking_lot::Mutex;
use screenrec::hotkey::{self, HotkeyAction};
use screenrec::{
    format_elapsed, render_menu, timers_for, AppConfig, MenuAction, RecordingController,
    RecordingResult, RecordingState, StopOutcome,
};
use std::cell::RefCell;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use windows::core::{w, HSTRING, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateFontW, CreateSolidBrush, DeleteObject, Ellipse, EndPaint, GetStockObject,
    InvalidateRect, SelectObject, SetBkMode, SetTextColor, TextOutW, UpdateWindow,
    CLIP_DEFAULT_PRECIS, DEFAULT_CHARSET, DEFAULT_PITCH, DEFAULT_QUALITY, FF_SWISS, FW_BOLD,
    FW_NORMAL, NULL_PEN, OUT_DEFAULT_PRECIS, PAINTSTRUCT, TRANSPARENT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::EnableWindow;
use windows::Win32::UI::WindowsAndMessaging::*;

pub type Controller = RecordingController<TranscoderFactory, OutlineBorder>;

const WINDOW_WIDTH: i32 = 760;
const WINDOW_HEIGHT: i32 = 150;

const BTN_WIDTH: i32 = 96;
const BTN_HEIGHT: i32 = 34;
const BTN_Y: i32 = 16;
const BTN_SPACING: i32 = 10;
const BTN_START_X: i32 = 16;

const COMBO_WIDTH: i32 = 110;
const COMBO_DROP_HEIGHT: i32 = 220;

const ID_COMBO_PRESET: u16 = 2001;

const ID_TIMER_DURATION: usize = 1;
const ID_TIMER_BLINK: usize = 2;

/// Lets the toolbar vanish before the overlay snapshots the desktop.
const HIDE_SETTLE: Duration = Duration::from_millis(150);

/// Posted by the finalize thread when a stopped recording is ready.
pub const WM_APP_STOP_DONE: u32 = WM_APP + 1;

/// Toolbar buttons, in layout order. Show/Exit only live in the tray menu.
const TOOLBAR_ACTIONS: [MenuAction; 8] = [
    MenuAction::FullScreen,
    MenuAction::Region,
    MenuAction::Window,
    MenuAction::Pause,
    MenuAction::Resume,
    MenuAction::Stop,
    MenuAction::Cancel,
    MenuAction::Restart,
];

static UI_STATE: OnceCell<Arc<Mutex<UiState>>> = OnceCell::new();

thread_local! {
    static TRAY: RefCell<Option<SystemTray>> = const { RefCell::new(None) };
}

pub struct UiState {
    controller: Controller,
    config: AppConfig,
    preset: AspectRatioPreset,
    status_text: String,
    blink_on: bool,
    timers: screenrec::TimerPlan,
    buttons: Vec<(MenuAction, isize)>,
    combo: isize,
    stop_tx: Sender<StopOutcome>,
    stop_rx: Receiver<StopOutcome>,
}

impl UiState {
    fn new(controller: Controller, config: AppConfig) -> Self {
        let (stop_tx, stop_rx) = unbounded();
        Self {
            preset: config.preset(),
            controller,
            config,
            status_text: RecordingState::Idle.display_text().to_string(),
            blink_on: true,
            timers: Default::default(),
            buttons: Vec::new(),
            combo: 0,
            stop_tx,
            stop_rx,
        }
    }
}

fn ui_state() -> Option<&'static Arc<Mutex<UiState>>> {
    UI_STATE.get()
}

fn hwnd_to_isize(hwnd: HWND) -> isize {
    hwnd.0 as isize
}

fn isize_to_hwnd(val: isize) -> HWND {
    HWND(val as *mut std::ffi::c_void)
}

fn selection_mode(action: MenuAction) -> Option<SelectionMode> {
    match action {
        MenuAction::FullScreen => Some(SelectionMode::FullScreen),
        MenuAction::Region => Some(SelectionMode::Region),
        MenuAction::Window => Some(SelectionMode::Window),
        _ => None,
    }
}

pub struct MainWindow {
    hwnd: HWND,
}

impl MainWindow {
    const CLASS_NAME: PCWSTR = w!("ScreenRecToolbar");

    pub fn create(controller: Controller, config: AppConfig) -> windows::core::Result<Self> {
        let state = Arc::new(Mutex::new(UiState::new(controller, config)));
        let _ = UI_STATE.set(state.clone());

        unsafe {
            let hmodule = GetModuleHandleW(None)?;
            let hinstance = HINSTANCE(hmodule.0);

            let bg_brush = CreateSolidBrush(COLORREF(0x00F5F5F5));
            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(Self::wnd_proc),
                hInstance: hinstance,
                hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                hbrBackground: bg_brush,
                lpszClassName: Self::CLASS_NAME,
                ..Default::default()
            };
            RegisterClassExW(&wc);

            let screen_width = GetSystemMetrics(SM_CXSCREEN);
            let x = (screen_width - WINDOW_WIDTH) / 2;

            let hwnd = CreateWindowExW(
                WS_EX_TOPMOST,
                Self::CLASS_NAME,
                w!("ScreenRec"),
                WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX,
                x,
                40,
                WINDOW_WIDTH,
                WINDOW_HEIGHT,
                HWND::default(),
                HMENU::default(),
                hinstance,
                None,
            )?;

            // Keep the toolbar out of full-screen recordings.
            if let Err(e) = SetWindowDisplayAffinity(hwnd, WDA_EXCLUDEFROMCAPTURE) {
                log::warn!("Toolbar will be visible in recordings: {}", e);
            }

            Self::create_controls(hwnd, hinstance, &state)?;

            TRAY.with(|tray| {
                let mut new_tray = SystemTray::new(hwnd);
                if let Err(e) = new_tray.show() {
                    log::warn!("Could not add tray icon: {}", e);
                }
                *tray.borrow_mut() = Some(new_tray);
            });

            let registered = hotkey::register_all(hwnd, &state.lock().config.hotkeys);
            log::debug!("{} global hotkeys registered", registered);

            refresh(hwnd);
            Ok(Self { hwnd })
        }
    }

    unsafe fn create_controls(
        hwnd: HWND,
        hinstance: HINSTANCE,
        state: &Arc<Mutex<UiState>>,
    ) -> windows::core::Result<()> {
        let mut buttons = Vec::with_capacity(TOOLBAR_ACTIONS.len());
        for action in TOOLBAR_ACTIONS {
            let button = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                w!("BUTTON"),
                &HSTRING::from(action.label()),
                WS_CHILD | WINDOW_STYLE(BS_PUSHBUTTON as u32),
                0,
                BTN_Y,
                BTN_WIDTH,
                BTN_HEIGHT,
                hwnd,
                HMENU(action.command_id() as _),
                hinstance,
                None,
            )?;
            buttons.push((action, hwnd_to_isize(button)));
        }

        let combo = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            w!("COMBOBOX"),
            PCWSTR::null(),
            WS_CHILD | WS_VISIBLE | WS_VSCROLL | WINDOW_STYLE(CBS_DROPDOWNLIST as u32),
            WINDOW_WIDTH - COMBO_WIDTH - 32,
            BTN_Y + 5,
            COMBO_WIDTH,
            COMBO_DROP_HEIGHT,
            hwnd,
            HMENU(ID_COMBO_PRESET as _),
            hinstance,
            None,
        )?;

        let current = state.lock().preset.name;
        let mut selected = 0;
        for (index, preset) in PRESETS.iter().enumerate() {
            let name = HSTRING::from(preset.name);
            SendMessageW(combo, CB_ADDSTRING, WPARAM(0), LPARAM(name.as_ptr() as isize));
            if preset.name == current {
                selected = index;
            }
        }
        SendMessageW(combo, CB_SETCURSEL, WPARAM(selected), LPARAM(0));

        let mut state = state.lock();
        state.buttons = buttons;
        state.combo = hwnd_to_isize(combo);
        Ok(())
    }

    pub fn show(&self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOW);
            let _ = UpdateWindow(self.hwnd);
        }
    }

    pub fn run_message_loop() -> i32 {
        unsafe {
            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).into() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            msg.wParam.0 as i32
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
                Self::on_paint(hwnd);
                LRESULT(0)
            }

            WM_COMMAND => {
                let id = (wparam.0 & 0xFFFF) as u16;
                let code = ((wparam.0 >> 16) & 0xFFFF) as u32;

                if id == ID_COMBO_PRESET {
                    if code == CBN_SELCHANGE {
                        on_preset_changed();
                    }
                } else if let Some(action) = MenuAction::from_command_id(id) {
                    dispatch(hwnd, action);
                }
                LRESULT(0)
            }

            WM_TIMER => {
                on_timer(hwnd, wparam.0);
                LRESULT(0)
            }

            WM_HOTKEY => {
                if let Some(action) = HotkeyAction::from_id(wparam.0 as i32) {
                    on_hotkey(hwnd, action);
                }
                LRESULT(0)
            }

            WM_TRAYICON => {
                let event = (lparam.0 & 0xFFFF) as u32;
                if event == WM_RBUTTONUP {
                    let menu = ui_state().map(|state| {
                        let state = state.lock();
                        render_menu(state.controller.state(), state.controller.is_paused())
                    });
                    if let Some(menu) = menu {
                        TRAY.with(|tray| {
                            if let Some(tray) = tray.borrow().as_ref() {
                                if let Err(e) = tray.show_context_menu(&menu) {
                                    log::warn!("Tray menu failed: {}", e);
                                }
                            }
                        });
                    }
                } else if event == WM_LBUTTONDBLCLK {
                    show_toolbar(hwnd);
                }
                LRESULT(0)
            }

            WM_APP_STOP_DONE => {
                on_stop_done(hwnd);
                LRESULT(0)
            }

            WM_CLOSE => {
                // Close hides to the tray; Exit lives in the tray menu.
                let _ = ShowWindow(hwnd, SW_HIDE);
                LRESULT(0)
            }

            WM_DESTROY => {
                hotkey::unregister_all(hwnd);
                if let Some(state) = ui_state() {
                    let mut state = state.lock();
                    if state.controller.state() == RecordingState::Recording {
                        state.controller.cancel_recording();
                    }
                }
                TRAY.with(|tray| {
                    *tray.borrow_mut() = None;
                });
                PostQuitMessage(0);
                LRESULT(0)
            }

            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }

    unsafe fn on_paint(hwnd: HWND) {
        let mut ps = PAINTSTRUCT::default();
        let hdc = BeginPaint(hwnd, &mut ps);

        let Some(state) = ui_state() else {
            let _ = EndPaint(hwnd, &ps);
            return;
        };
        let (status, elapsed, recording, dot_visible) = {
            let state = state.lock();
            let recording = state.controller.state() == RecordingState::Recording;
            let paused = state.controller.is_paused();
            (
                state.status_text.clone(),
                format_elapsed(state.controller.duration()),
                recording,
                recording && (paused || state.blink_on),
            )
        };

        let text_y = BTN_Y + BTN_HEIGHT + 18;
        SetBkMode(hdc, TRANSPARENT);

        if dot_visible {
            let brush = CreateSolidBrush(COLORREF(0x002311E8));
            let old_brush = SelectObject(hdc, brush);
            let old_pen = SelectObject(hdc, GetStockObject(NULL_PEN));
            let _ = Ellipse(hdc, BTN_START_X, text_y + 3, BTN_START_X + 14, text_y + 17);
            SelectObject(hdc, old_pen);
            SelectObject(hdc, old_brush);
            let _ = DeleteObject(brush);
        }

        let time_font = make_font(22, FW_BOLD.0 as i32);
        let old_font = SelectObject(hdc, time_font);
        SetTextColor(hdc, COLORREF(if recording { 0x002311E8 } else { 0x00333333 }));
        let elapsed_wide: Vec<u16> = elapsed.encode_utf16().collect();
        let _ = TextOutW(hdc, BTN_START_X + 22, text_y - 1, &elapsed_wide);

        let status_font = make_font(18, FW_NORMAL.0 as i32);
        SelectObject(hdc, status_font);
        SetTextColor(hdc, COLORREF(0x00666666));
        let status_wide: Vec<u16> = status.encode_utf16().collect();
        let _ = TextOutW(hdc, BTN_START_X + 120, text_y + 2, &status_wide);

        SelectObject(hdc, old_font);
        let _ = DeleteObject(time_font);
        let _ = DeleteObject(status_font);

        let _ = EndPaint(hwnd, &ps);
    }
}

unsafe fn make_font(height: i32, weight: i32) -> windows::Win32::Graphics::Gdi::HFONT {
    CreateFontW(
        height,
        0,
        0,
        0,
        weight,
        0,
        0,
        0,
        DEFAULT_CHARSET.0 as u32,
        OUT_DEFAULT_PRECIS.0 as u32,
        CLIP_DEFAULT_PRECIS.0 as u32,
        DEFAULT_QUALITY.0 as u32,
        (DEFAULT_PITCH.0 | FF_SWISS.0) as u32,
        w!("Segoe UI"),
    )
}

/// Re-project buttons, combo, timers and tray tooltip from the controller.
fn refresh(hwnd: HWND) {
    let Some(state) = ui_state() else {
        return;
    };
    let mut state = state.lock();
    let recording_state = state.controller.state();
    let paused = state.controller.is_paused();
    let menu = render_menu(recording_state, paused);

    unsafe {
        let mut x = BTN_START_X;
        for (action, button) in &state.buttons {
            let button = isize_to_hwnd(*button);
            if menu.is_visible(*action) {
                let _ = MoveWindow(button, x, BTN_Y, BTN_WIDTH, BTN_HEIGHT, true);
                let _ = EnableWindow(button, menu.is_enabled(*action));
                let _ = ShowWindow(button, SW_SHOW);
                x += BTN_WIDTH + BTN_SPACING;
            } else {
                let _ = ShowWindow(button, SW_HIDE);
            }
        }
        let _ = EnableWindow(isize_to_hwnd(state.combo), recording_state.can_start());

        let plan = timers_for(recording_state, paused);
        sync_timer(hwnd, ID_TIMER_DURATION, state.timers.duration, plan.duration, screenrec::timing::DURATION_TICK);
        sync_timer(hwnd, ID_TIMER_BLINK, state.timers.blink, plan.blink, screenrec::timing::BLINK_TICK);
        if !plan.blink {
            state.blink_on = true;
        }
        state.timers = plan;

        let _ = InvalidateRect(hwnd, None, true);
    }

    let tooltip = format!("ScreenRec - {}", recording_state.display_text());
    TRAY.with(|tray| {
        if let Some(tray) = tray.borrow_mut().as_mut() {
            tray.set_tooltip(&tooltip);
        }
    });
}

unsafe fn sync_timer(hwnd: HWND, id: usize, running: bool, wanted: bool, period: Duration) {
    if wanted && !running {
        SetTimer(hwnd, id, period.as_millis() as u32, None);
    } else if !wanted && running {
        let _ = KillTimer(hwnd, id);
    }
}

fn show_toolbar(hwnd: HWND) {
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
    }
}

fn show_error(hwnd: HWND, message: &str) {
    unsafe {
        let _ = MessageBoxW(
            hwnd,
            &HSTRING::from(message),
            w!("ScreenRec"),
            MB_OK | MB_ICONWARNING,
        );
    }
}

fn set_status(text: impl Into<String>) {
    if let Some(state) = ui_state() {
        state.lock().status_text = text.into();
    }
}

fn dispatch(hwnd: HWND, action: MenuAction) {
    log::debug!("Action {:?}", action);

    if let Some(mode) = selection_mode(action) {
        start_capture(hwnd, mode);
        return;
    }

    let Some(state) = ui_state() else {
        return;
    };

    match action {
        MenuAction::Pause | MenuAction::Resume => {
            let mut state = state.lock();
            if state.controller.toggle_pause() {
                state.status_text = if state.controller.is_paused() {
                    "Paused".into()
                } else {
                    RecordingState::Recording.display_text().into()
                };
            }
        }
        MenuAction::Stop => begin_stop(hwnd),
        MenuAction::Cancel => {
            let mut state = state.lock();
            state.controller.cancel_recording();
            state.status_text = "Recording discarded".into();
        }
        MenuAction::Restart => {
            let error = {
                let mut state = state.lock();
                match state.controller.restart_recording() {
                    Ok(()) => {
                        state.status_text = "Recording restarted".into();
                        None
                    }
                    Err(e) => {
                        state.status_text = e.to_string();
                        Some(e.to_string())
                    }
                }
            };
            if let Some(message) = error {
                refresh(hwnd);
                show_error(hwnd, &message);
            }
        }
        MenuAction::Show => show_toolbar(hwnd),
        MenuAction::Exit => {
            let recording = state.lock().controller.state() == RecordingState::Recording;
            if recording {
                let answer = unsafe {
                    MessageBoxW(
                        hwnd,
                        w!("A recording is in progress. Discard it and exit?"),
                        w!("ScreenRec"),
                        MB_YESNO | MB_ICONQUESTION,
                    )
                };
                if answer != IDYES {
                    return;
                }
            }
            unsafe {
                let _ = DestroyWindow(hwnd);
            }
            return;
        }
        MenuAction::FullScreen | MenuAction::Region | MenuAction::Window => {}
    }

    refresh(hwnd);
}

/// Hide the toolbar, run the selection overlay and start recording the
/// confirmed region.
fn start_capture(hwnd: HWND, mode: SelectionMode) {
    let Some(state) = ui_state() else {
        return;
    };

    let preset = {
        let mut state = state.lock();
        if !state.controller.begin_selection() {
            return;
        }
        state.status_text = RecordingState::Selecting.display_text().into();
        state.preset
    };
    refresh(hwnd);

    unsafe {
        let _ = ShowWindow(hwnd, SW_HIDE);
    }
    thread::sleep(HIDE_SETTLE);

    let outcome = OverlayWindow::show(mode, preset);

    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
    }

    let error = {
        let mut state = state.lock();
        match outcome {
            Ok(SelectionOutcome::Selected(region)) => {
                let description = region.describe();
                match state.controller.start_recording(region) {
                    Ok(()) => {
                        state.status_text = format!("Recording {}", description);
                        None
                    }
                    Err(e) => {
                        state.status_text = "Could not start recording".into();
                        Some(e.to_string())
                    }
                }
            }
            Ok(SelectionOutcome::Cancelled) => {
                state.controller.cancel_selection();
                state.status_text = "Selection cancelled".into();
                None
            }
            Err(e) => {
                log::error!("Selection overlay failed: {}", e);
                state.controller.cancel_selection();
                state.status_text = "Selection failed".into();
                Some(e.to_string())
            }
        }
    };

    refresh(hwnd);
    if let Some(message) = error {
        show_error(hwnd, &message);
    }
}

/// Recording -> Stopping; the blocking finalize runs on a worker thread and
/// posts `WM_APP_STOP_DONE` back.
fn begin_stop(hwnd: HWND) {
    let Some(state) = ui_state() else {
        return;
    };

    let (pending, stop_tx) = {
        let mut state = state.lock();
        let Some(pending) = state.controller.begin_stop() else {
            return;
        };
        state.status_text = RecordingState::Stopping.display_text().into();
        (pending, state.stop_tx.clone())
    };

    let hwnd_raw = hwnd_to_isize(hwnd);
    let spawned = thread::Builder::new()
        .name("screenrec-finalize".into())
        .spawn(move || {
            let outcome = pending.finish();
            if stop_tx.send(outcome).is_ok() {
                unsafe {
                    let _ = PostMessageW(isize_to_hwnd(hwnd_raw), WM_APP_STOP_DONE, WPARAM(0), LPARAM(0));
                }
            }
        });

    if let Err(e) = spawned {
        log::error!("Could not start finalize thread: {}", e);
        // The closure and its PendingStop are gone; nothing will post back.
        let error = {
            let mut state = state.lock();
            state.controller.abort_stop();
            let error = state.controller.take_last_error();
            if let Some(message) = &error {
                state.status_text = message.clone();
            }
            error
        };
        refresh(hwnd);
        if let Some(message) = error {
            show_error(hwnd, &message);
        }
    }
}

fn on_stop_done(hwnd: HWND) {
    let Some(state) = ui_state() else {
        return;
    };

    let (result, error) = {
        let mut state = state.lock();
        let Ok(outcome) = state.stop_rx.try_recv() else {
            return;
        };
        let result = state.controller.complete_stop(outcome);
        let error = state.controller.take_last_error();
        if let Some(message) = &error {
            state.status_text = message.clone();
        }
        (result, error)
    };
    refresh(hwnd);

    if let Some(message) = error {
        show_error(hwnd, &message);
    }
    if let Some(result) = result {
        save_recording(hwnd, result);
    }
}

/// Ask where to save, then move the temp file there.
fn save_recording(hwnd: HWND, result: RecordingResult) {
    let Some(state) = ui_state() else {
        result.discard();
        return;
    };

    log::info!(
        "Recording ready: {} ({:.1}s)",
        result.temp_file.display(),
        result.duration.as_secs_f64()
    );

    let destination = rfd::FileDialog::new()
        .add_filter("MP4 video", &[encoder::VIDEO_EXTENSION])
        .set_directory(&result.default_folder)
        .set_file_name(result.suggested_file_name.clone())
        .save_file();

    let Some(destination) = destination else {
        log::info!("Save cancelled; discarding recording");
        result.discard();
        set_status("Recording discarded");
        refresh(hwnd);
        return;
    };

    let retry = state.lock().controller.settings().save_retry;
    match result.save_to(&destination, retry) {
        Ok(saved) => {
            set_status(format!("Saved {}", saved.display()));
            remember_folder(&saved);
        }
        Err(e) => {
            log::error!("Save failed: {}", e);
            set_status("Save failed");
            refresh(hwnd);
            show_error(hwnd, &e.to_string());
            return;
        }
    }
    refresh(hwnd);
}

/// Make the folder of the last save the dialog's next default.
fn remember_folder(saved: &std::path::Path) {
    let Some(state) = ui_state() else {
        return;
    };
    let Some(folder) = saved.parent() else {
        return;
    };

    let mut state = state.lock();
    if state.config.default_folder.as_deref() == Some(folder) {
        return;
    }
    state.config.default_folder = Some(folder.to_path_buf());
    let settings = state.config.controller_settings();
    state.controller.set_settings(settings);
    if let Err(e) = state.config.save() {
        log::warn!("Could not save config: {}", e);
    }
}

fn on_preset_changed() {
    let Some(state) = ui_state() else {
        return;
    };
    let mut state = state.lock();
    let index = unsafe {
        SendMessageW(isize_to_hwnd(state.combo), CB_GETCURSEL, WPARAM(0), LPARAM(0)).0
    };
    let Some(preset) = usize::try_from(index).ok().and_then(|i| PRESETS.get(i)) else {
        return;
    };

    state.preset = *preset;
    state.config.default_preset = preset.name.to_string();
    log::info!("Selection preset: {}", preset.name);
    if let Err(e) = state.config.save() {
        log::warn!("Could not save config: {}", e);
    }
}

fn on_timer(hwnd: HWND, id: usize) {
    let Some(state) = ui_state() else {
        return;
    };

    match id {
        ID_TIMER_DURATION => {
            let failure = state.lock().controller.check_recorder();
            if let Some(message) = failure {
                set_status(message.clone());
                refresh(hwnd);
                show_error(hwnd, &message);
                return;
            }
        }
        ID_TIMER_BLINK => {
            let mut state = state.lock();
            state.blink_on = !state.blink_on;
        }
        _ => return,
    }

    unsafe {
        let _ = InvalidateRect(hwnd, None, false);
    }
}

fn on_hotkey(hwnd: HWND, action: HotkeyAction) {
    let Some(state) = ui_state() else {
        return;
    };
    let current = state.lock().controller.state();
    log::debug!("Hotkey {:?} while {:?}", action, current);

    match (action, current) {
        (HotkeyAction::StartStop, RecordingState::Idle) => start_capture(hwnd, SelectionMode::Region),
        (HotkeyAction::StartStop, RecordingState::Recording) => {
            begin_stop(hwnd);
            refresh(hwnd);
        }
        (HotkeyAction::PauseResume, RecordingState::Recording) => dispatch(hwnd, MenuAction::Pause),
        (HotkeyAction::Cancel, RecordingState::Recording) => dispatch(hwnd, MenuAction::Cancel),
        _ => {}
    }
}
