//! ScreenRec - Windows screen recorder producing H.264 MP4 files

#![cfg_attr(windows, windows_subsystem = "windows")]

#[cfg(windows)]
mod tray;
#[cfg(windows)]
mod ui;

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use crate::ui::MainWindow;
    use encoder::TranscoderFactory;
    use overlay::OutlineBorder;
    use screenrec::{logging, AppConfig, RecordingController};
    use windows::Win32::UI::HiDpi::{
        SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    };

    // Selection and capture work in physical pixels.
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }

    logging::init(&logging::log_path());

    let config = AppConfig::load();
    log::debug!("Config: {:?}", config);

    let controller = RecordingController::new(
        TranscoderFactory,
        OutlineBorder::new(config.border_style()),
        config.controller_settings(),
    );

    let main_window = MainWindow::create(controller, config)?;
    main_window.show();
    let exit_code = MainWindow::run_message_loop();

    log::info!("Exiting with code {}", exit_code);
    Ok(())
}

#[cfg(not(windows))]
fn main() {
    eprintln!("ScreenRec is a Windows application; this platform is unsupported.");
    std::process::exit(1);
}
