//! Temp files, suggested names and the save step

use crate::{EncoderError, EncoderResult};
use chrono::{DateTime, Local};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

pub const VIDEO_EXTENSION: &str = "mp4";

const TEMP_DIR_NAME: &str = "screenrec";

/// Fresh working file path under `%TEMP%/screenrec`.
pub fn temp_output_path() -> EncoderResult<PathBuf> {
    temp_output_path_in(&std::env::temp_dir().join(TEMP_DIR_NAME))
}

pub fn temp_output_path_in(dir: &Path) -> EncoderResult<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(dir.join(format!("{}.{}", uuid::Uuid::new_v4(), VIDEO_EXTENSION)))
}

/// `yyyy-MM-dd_HH-mm-ss.mp4`
pub fn suggested_file_name(at: DateTime<Local>) -> String {
    format!("{}.{}", at.format("%Y-%m-%d_%H-%M-%S"), VIDEO_EXTENSION)
}

/// Where the save dialog opens when the user has not picked a folder yet.
pub fn default_folder() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::document_dir)
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
}

/// Size of the file at `path`, 0 when it is missing.
pub fn output_len(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Remove a working file. Missing files are fine.
pub fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Discarded {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not delete {}: {}", path.display(), e),
    }
}

/// Bounded retry for file operations racing the encoder's trailing handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(300),
        }
    }
}

/// Filesystem calls a move is made of
struct MoveOps {
    rename: fn(&Path, &Path) -> io::Result<()>,
    remove_source: fn(&Path) -> io::Result<()>,
}

const FS_OPS: MoveOps = MoveOps {
    rename: |src, dst| fs::rename(src, dst),
    remove_source: |src| fs::remove_file(src),
};

/// Move `src` to `dst`, replacing `dst`.
///
/// Rename first, then copy + delete (different volume). Sharing violations,
/// including a source that can be copied but not yet deleted, are retried
/// with a pause between attempts; the last error is returned.
pub fn move_with_retry(src: &Path, dst: &Path, policy: RetryPolicy) -> EncoderResult<PathBuf> {
    move_with(src, dst, policy, &FS_OPS)
}

fn move_with(src: &Path, dst: &Path, policy: RetryPolicy, ops: &MoveOps) -> EncoderResult<PathBuf> {
    let attempts = policy.attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match try_move(src, dst, ops) {
            Ok(()) => {
                log::info!("Saved recording to {}", dst.display());
                return Ok(dst.to_path_buf());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EncoderError::Save { path: dst.to_path_buf(), source: e });
            }
            Err(e) => {
                log::warn!(
                    "Save attempt {}/{} to {} failed: {}",
                    attempt,
                    attempts,
                    dst.display(),
                    e
                );
                last_error = Some(e);
                if attempt < attempts {
                    thread::sleep(policy.delay);
                }
            }
        }
    }

    Err(EncoderError::Save {
        path: dst.to_path_buf(),
        source: last_error.unwrap_or_else(|| ErrorKind::Other.into()),
    })
}

fn try_move(src: &Path, dst: &Path, ops: &MoveOps) -> io::Result<()> {
    if !src.exists() {
        return Err(ErrorKind::NotFound.into());
    }
    if dst.exists() {
        fs::remove_file(dst)?;
    }
    if (ops.rename)(src, dst).is_ok() {
        return Ok(());
    }

    fs::copy(src, dst)?;
    if let Err(e) = (ops.remove_source)(src) {
        // Still locked by the encoder; undo the copy so the next attempt
        // starts clean and the working file is not left behind.
        let _ = fs::remove_file(dst);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_suggested_file_name_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).single().expect("valid time");
        assert_eq!(suggested_file_name(at), "2024-03-07_09-05-02.mp4");
    }

    #[test]
    fn test_temp_paths_are_unique_mp4() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = temp_output_path_in(dir.path()).expect("path");
        let b = temp_output_path_in(dir.path()).expect("path");

        assert_ne!(a, b);
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("mp4"));
        assert!(a.starts_with(dir.path()));
    }

    #[test]
    fn test_output_len_of_missing_file_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(output_len(&dir.path().join("nope.mp4")), 0);

        let file = dir.path().join("clip.mp4");
        fs::write(&file, b"0123456789").expect("write");
        assert_eq!(output_len(&file), 10);
    }

    #[test]
    fn test_move_with_retry_replaces_destination() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("work.mp4");
        let dst = dir.path().join("saved.mp4");
        fs::write(&src, b"new").expect("write src");
        fs::write(&dst, b"old").expect("write dst");

        let saved = move_with_retry(&src, &dst, RetryPolicy::default()).expect("move");

        assert_eq!(saved, dst);
        assert!(!src.exists(), "source should be gone");
        assert_eq!(fs::read(&dst).expect("read"), b"new");
    }

    #[test]
    fn test_move_missing_source_fails_fast() {
        let dir = tempfile::tempdir().expect("tempdir");
        let policy = RetryPolicy {
            attempts: 3,
            delay: Duration::from_secs(5),
        };

        let started = std::time::Instant::now();
        let err = move_with_retry(&dir.path().join("gone.mp4"), &dir.path().join("out.mp4"), policy)
            .expect_err("missing source");

        assert!(matches!(err, EncoderError::Save { .. }));
        assert!(started.elapsed() < Duration::from_secs(5), "should not retry a missing file");
    }

    static REMOVE_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn refuse_rename(_: &Path, _: &Path) -> io::Result<()> {
        Err(io::Error::new(ErrorKind::Other, "cross-device"))
    }

    /// Locked on the first delete, free afterwards.
    fn remove_after_first_lock(src: &Path) -> io::Result<()> {
        if REMOVE_CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(io::Error::new(ErrorKind::PermissionDenied, "in use"));
        }
        fs::remove_file(src)
    }

    fn always_locked(_: &Path) -> io::Result<()> {
        Err(io::Error::new(ErrorKind::PermissionDenied, "in use"))
    }

    #[test]
    fn test_locked_source_after_copy_is_retried() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("work.mp4");
        let dst = dir.path().join("saved.mp4");
        fs::write(&src, b"frames").expect("write src");

        let ops = MoveOps { rename: refuse_rename, remove_source: remove_after_first_lock };
        let policy = RetryPolicy { attempts: 3, delay: Duration::ZERO };
        let saved = move_with(&src, &dst, policy, &ops).expect("second attempt succeeds");

        assert_eq!(saved, dst);
        assert_eq!(REMOVE_CALLS.load(Ordering::SeqCst), 2);
        assert!(!src.exists(), "working file should be gone");
        assert_eq!(fs::read(&dst).expect("read"), b"frames");
    }

    #[test]
    fn test_source_that_stays_locked_fails_without_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("work.mp4");
        let dst = dir.path().join("saved.mp4");
        fs::write(&src, b"frames").expect("write src");

        let ops = MoveOps { rename: refuse_rename, remove_source: always_locked };
        let policy = RetryPolicy { attempts: 2, delay: Duration::ZERO };
        let err = move_with(&src, &dst, policy, &ops).expect_err("never unlocked");

        assert!(matches!(err, EncoderError::Save { .. }));
        assert!(src.exists(), "recording must survive a failed save");
        assert!(!dst.exists());
    }

    #[test]
    fn test_discard_ignores_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("clip.mp4");
        discard(&file);

        fs::write(&file, b"x").expect("write");
        discard(&file);
        assert!(!file.exists());
    }
}
