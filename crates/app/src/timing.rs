//! Recording clock and UI timer projection

use crate::state::RecordingState;
use std::time::{Duration, Instant};

/// Elapsed-time display refresh
pub const DURATION_TICK: Duration = Duration::from_millis(100);
/// Recording indicator blink period
pub const BLINK_TICK: Duration = Duration::from_millis(500);

/// Wall-clock recording time with paused intervals excluded
#[derive(Debug, Clone, Default)]
pub struct DurationTracker {
    started: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl DurationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Instant) {
        self.started = Some(now);
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self, now: Instant) {
        if self.started.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(at);
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        let Some(started) = self.started else {
            return Duration::ZERO;
        };
        // While paused the clock stands still at the pause instant.
        let end = self.paused_at.unwrap_or(now);
        end.saturating_duration_since(started)
            .saturating_sub(self.paused_total)
    }

    /// Freeze the clock and return the final duration.
    pub fn stop(&mut self, now: Instant) -> Duration {
        let elapsed = self.elapsed(now);
        *self = Self::default();
        elapsed
    }
}

/// `MM:SS.t`; minutes keep counting past 59.
pub fn format_elapsed(elapsed: Duration) -> String {
    let tenths = elapsed.as_millis() / 100;
    let minutes = tenths / 600;
    let seconds = (tenths / 10) % 60;
    format!("{:02}:{:02}.{}", minutes, seconds, tenths % 10)
}

/// Which UI timers should be running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerPlan {
    pub duration: bool,
    pub blink: bool,
}

/// Timers are alive only while recording; the indicator holds still while
/// paused.
pub fn timers_for(state: RecordingState, paused: bool) -> TimerPlan {
    let recording = state == RecordingState::Recording;
    TimerPlan {
        duration: recording,
        blink: recording && !paused,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn test_fresh_tracker_reports_zero() {
        let tracker = DurationTracker::new();
        assert_eq!(tracker.elapsed(Instant::now()), Duration::ZERO);
        assert!(!tracker.is_running());
    }

    #[test]
    fn test_paused_interval_is_excluded() {
        let t0 = Instant::now();
        let mut tracker = DurationTracker::new();
        tracker.start(t0);
        tracker.pause(t0 + 2 * SEC);

        // Clock stands still while paused.
        assert_eq!(tracker.elapsed(t0 + 5 * SEC), 2 * SEC);

        tracker.resume(t0 + 7 * SEC);
        assert_eq!(tracker.elapsed(t0 + 10 * SEC), 5 * SEC);
        assert_eq!(tracker.stop(t0 + 10 * SEC), 5 * SEC);
        assert!(!tracker.is_running());
    }

    #[test]
    fn test_double_pause_keeps_first_instant() {
        let t0 = Instant::now();
        let mut tracker = DurationTracker::new();
        tracker.start(t0);
        tracker.pause(t0 + SEC);
        tracker.pause(t0 + 3 * SEC);
        tracker.resume(t0 + 4 * SEC);

        assert_eq!(tracker.elapsed(t0 + 4 * SEC), SEC);
    }

    #[test]
    fn test_resume_without_pause_is_noop() {
        let t0 = Instant::now();
        let mut tracker = DurationTracker::new();
        tracker.start(t0);
        tracker.resume(t0 + SEC);
        assert_eq!(tracker.elapsed(t0 + 2 * SEC), 2 * SEC);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00.0");
        assert_eq!(format_elapsed(Duration::from_millis(65_430)), "01:05.4");
        assert_eq!(format_elapsed(Duration::from_secs(3600)), "60:00.0");
    }

    #[test]
    fn test_timers_follow_state() {
        assert_eq!(timers_for(RecordingState::Idle, false), TimerPlan::default());
        assert_eq!(timers_for(RecordingState::Stopping, false), TimerPlan::default());
        assert_eq!(
            timers_for(RecordingState::Recording, false),
            TimerPlan { duration: true, blink: true }
        );
        assert_eq!(
            timers_for(RecordingState::Recording, true),
            TimerPlan { duration: true, blink: false }
        );
    }
}
