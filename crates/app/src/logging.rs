//! File logging for the GUI build
//!
//! The binary has no console, so `env_logger` writes to
//! `<config_dir>/screenrec/screenrec.log`. `RUST_LOG` still overrides the
//! default `info` filter.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "screenrec.log";

pub fn log_path() -> PathBuf {
    crate::config::config_dir().join(LOG_FILE_NAME)
}

/// Initialise logging into `path`, truncating the previous run's log.
/// Falls back to stderr when the file cannot be created.
pub fn init(path: &Path) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    match open_log(path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => eprintln!("Could not open log file {}: {}", path.display(), e),
    }

    if builder.try_init().is_err() {
        return;
    }
    log::info!(
        "ScreenRec {} starting, logging to {}",
        env!("CARGO_PKG_VERSION"),
        path.display()
    );
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a").join("b").join(LOG_FILE_NAME);

        open_log(&path).expect("open log");
        assert!(path.exists());
    }
}
