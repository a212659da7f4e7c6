//! Recording states and the finished-recording hand-off

use encoder::output::{discard, move_with_retry};
use encoder::{EncoderResult, RetryPolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Controller state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordingState {
    /// Ready to record
    #[default]
    Idle,
    /// Selection overlay is up
    Selecting,
    /// Recorder running (possibly paused)
    Recording,
    /// Waiting for the recorder to finalize the file
    Stopping,
}

impl RecordingState {
    /// Get display text for current state
    pub fn display_text(&self) -> &'static str {
        match self {
            RecordingState::Idle => "Ready",
            RecordingState::Selecting => "Selecting...",
            RecordingState::Recording => "Recording",
            RecordingState::Stopping => "Finishing...",
        }
    }

    /// Check if a new capture can be started
    pub fn can_start(&self) -> bool {
        matches!(self, RecordingState::Idle)
    }
}

/// A finished recording waiting to be saved. The temp file belongs to this
/// value until it is saved or discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingResult {
    pub temp_file: PathBuf,
    pub suggested_file_name: String,
    pub default_folder: PathBuf,
    pub duration: Duration,
}

impl RecordingResult {
    /// Move the recording to `destination`, replacing any existing file.
    pub fn save_to(self, destination: &Path, retry: RetryPolicy) -> EncoderResult<PathBuf> {
        move_with_retry(&self.temp_file, destination, retry)
    }

    /// Drop the recording without saving.
    pub fn discard(self) {
        discard(&self.temp_file);
    }
}
