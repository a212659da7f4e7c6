//! Persistent settings (`<config_dir>/screenrec/config.json`)

use crate::controller::ControllerSettings;
use capture_wgc::AspectRatioPreset;
use encoder::RetryPolicy;
use overlay::BorderStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_DIR_NAME: &str = "screenrec";
const CONFIG_FILE_NAME: &str = "config.json";

/// Global shortcut strings such as `Ctrl+Shift+R`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    pub start_stop: String,
    pub pause_resume: String,
    pub cancel: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            start_stop: "Ctrl+Shift+R".into(),
            pause_resume: "Ctrl+Shift+P".into(),
            cancel: "Ctrl+Shift+X".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name of the preset used for region selection.
    pub default_preset: String,
    /// Folder the save dialog opens in; `None` means the Videos folder.
    pub default_folder: Option<PathBuf>,
    pub hotkeys: HotkeyConfig,
    /// `RRGGBB`
    pub border_color: String,
    pub border_thickness: u32,
    pub finalize_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub save_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_preset: AspectRatioPreset::default().name.to_string(),
            default_folder: None,
            hotkeys: HotkeyConfig::default(),
            border_color: "E81123".into(),
            border_thickness: 3,
            finalize_timeout_secs: 120,
            settle_delay_ms: 500,
            save_retries: 5,
        }
    }
}

/// `<config_dir>/screenrec`, falling back to the home directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

impl AppConfig {
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Read and validate the file at `path`. A missing or malformed file
    /// yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No config at {}; using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                log::warn!("Failed to read config {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(mut config) => {
                config.validate();
                config
            }
            Err(e) => {
                log::warn!("Failed to parse config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        log::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp numeric settings into range and replace unusable strings.
    pub fn validate(&mut self) {
        self.border_thickness = self.border_thickness.clamp(1, 10);
        self.finalize_timeout_secs = self.finalize_timeout_secs.clamp(5, 600);
        self.settle_delay_ms = self.settle_delay_ms.min(5000);
        self.save_retries = self.save_retries.clamp(1, 20);

        if BorderStyle::parse_color(&self.border_color).is_none() {
            log::warn!("Invalid border colour {:?}; using default", self.border_color);
            self.border_color = Self::default().border_color;
        }
        if AspectRatioPreset::find(&self.default_preset).is_none() {
            log::warn!("Unknown preset {:?}; using Free", self.default_preset);
            self.default_preset = Self::default().default_preset;
        }
    }

    pub fn preset(&self) -> AspectRatioPreset {
        AspectRatioPreset::find(&self.default_preset)
            .copied()
            .unwrap_or_default()
    }

    pub fn border_style(&self) -> BorderStyle {
        let defaults = BorderStyle::default();
        BorderStyle {
            color: BorderStyle::parse_color(&self.border_color).unwrap_or(defaults.color),
            paused_color: defaults.paused_color,
            thickness: self.border_thickness,
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            finalize_timeout: Duration::from_secs(self.finalize_timeout_secs),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            save_retry: RetryPolicy {
                attempts: self.save_retries,
                ..RetryPolicy::default()
            },
            default_folder: self.default_folder.clone(),
            ..ControllerSettings::default()
        }
    }
}
