//! Single-shot completion signal shared between the recorder and the stop path

use parking_lot::{Condvar, Mutex};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Terminal result reported by the encoder backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderOutcome {
    Completed(PathBuf),
    Failed(String),
}

/// Only one terminal signal is expected per session; if more arrive, the last
/// one wins.
#[derive(Clone, Default)]
pub struct CompletionSignal {
    inner: Arc<(Mutex<Option<RecorderOutcome>>, Condvar)>,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self, outcome: RecorderOutcome) {
        let (slot, cond) = &*self.inner;
        *slot.lock() = Some(outcome);
        cond.notify_all();
    }

    /// Block until signalled or until `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Option<RecorderOutcome> {
        let deadline = Instant::now() + timeout;
        let (slot, cond) = &*self.inner;
        let mut guard = slot.lock();
        while guard.is_none() {
            if cond.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        guard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_times_out_without_signal() {
        let signal = CompletionSignal::new();
        let started = Instant::now();
        assert_eq!(signal.wait(Duration::from_millis(30)), None);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_signal_from_other_thread_unblocks_wait() {
        let signal = CompletionSignal::new();
        let remote = signal.clone();

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.signal(RecorderOutcome::Completed(PathBuf::from("out.mp4")));
        });

        let outcome = signal.wait(Duration::from_secs(5));
        assert_eq!(outcome, Some(RecorderOutcome::Completed(PathBuf::from("out.mp4"))));
        worker.join().expect("worker thread");
    }

    #[test]
    fn test_last_write_wins() {
        let signal = CompletionSignal::new();
        signal.signal(RecorderOutcome::Completed(PathBuf::from("a.mp4")));
        signal.signal(RecorderOutcome::Failed("disk full".into()));

        // Already signalled: returns immediately.
        assert_eq!(
            signal.wait(Duration::ZERO),
            Some(RecorderOutcome::Failed("disk full".into()))
        );
    }
}
