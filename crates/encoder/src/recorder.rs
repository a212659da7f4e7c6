//! Recorder traits driven by the recording controller

use crate::output::discard;
use crate::signal::{CompletionSignal, RecorderOutcome};
use crate::{EncoderParams, EncoderResult};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Phase reported by the encoder backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecorderStatus {
    #[default]
    Idle,
    Recording,
    Paused,
    Finishing,
    Finished,
    Failed,
}

impl RecorderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecorderStatus::Finished | RecorderStatus::Failed)
    }
}

/// Callback sink handed to the backend. May be used from any thread.
#[derive(Clone, Default)]
pub struct RecorderEvents {
    completion: CompletionSignal,
    status: Arc<Mutex<RecorderStatus>>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl RecorderEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self, path: PathBuf) {
        log::info!("Recorder finished writing {}", path.display());
        *self.status.lock() = RecorderStatus::Finished;
        self.completion.signal(RecorderOutcome::Completed(path));
    }

    pub fn failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        log::error!("Recorder failed: {}", reason);
        *self.status.lock() = RecorderStatus::Failed;
        *self.last_error.lock() = Some(reason.clone());
        self.completion.signal(RecorderOutcome::Failed(reason));
    }

    /// Progress update from the backend. Ignored once the session has
    /// finished or failed.
    pub fn status(&self, phase: RecorderStatus) {
        let mut status = self.status.lock();
        if status.is_terminal() {
            log::debug!("Ignoring recorder status {:?} after {:?}", phase, *status);
            return;
        }
        log::debug!("Recorder status: {:?}", phase);
        *status = phase;
    }

    pub fn current_status(&self) -> RecorderStatus {
        *self.status.lock()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn wait_for_completion(&self, timeout: Duration) -> Option<RecorderOutcome> {
        self.completion.wait(timeout)
    }
}

/// Shared by a handle's `start` and the backend worker it spawns. Once the
/// handle stops waiting, the worker must not leave an output file behind.
#[derive(Debug, Clone, Default)]
pub struct StartGate {
    abandoned: Arc<AtomicBool>,
}

impl StartGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle side: give up on the worker.
    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Worker side, after `resource` has created `output`. When abandoned,
    /// the resource is released first so the file can be deleted.
    pub fn release_if_abandoned<T>(&self, resource: T, output: &Path) -> Option<T> {
        if !self.is_abandoned() {
            return Some(resource);
        }
        drop(resource);
        discard(output);
        log::debug!("Start abandoned; removed {}", output.display());
        None
    }
}

/// A configured encoder session. Dropping the handle releases the encoder
/// and its hold on the output file.
pub trait RecorderHandle: Send {
    fn start(&mut self, output: &Path) -> EncoderResult<()>;

    fn pause(&mut self) -> EncoderResult<()>;

    fn resume(&mut self) -> EncoderResult<()>;

    /// Ask the encoder to finalize. Completion arrives through `RecorderEvents`.
    fn stop(&mut self) -> EncoderResult<()>;
}

/// Builds recorder handles from encoder parameters
pub trait RecorderFactory {
    type Handle: RecorderHandle + 'static;

    fn configure(&self, params: &EncoderParams, events: RecorderEvents) -> EncoderResult<Self::Handle>;
}
