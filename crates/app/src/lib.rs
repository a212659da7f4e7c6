//! ScreenRec application core
//!
//! Platform-independent recording controller, state, timers, menu projection,
//! configuration and hotkey parsing. The Win32 toolbar lives in the binary.

pub mod config;
pub mod controller;
pub mod hotkey;
pub mod logging;
pub mod menu;
pub mod state;
pub mod timing;

pub use config::AppConfig;
pub use controller::{ControllerError, ControllerSettings, PendingStop, RecordingController, StopOutcome};
pub use menu::{render_menu, MenuAction, MenuModel};
pub use state::{RecordingResult, RecordingState};
pub use timing::{format_elapsed, timers_for, TimerPlan};
