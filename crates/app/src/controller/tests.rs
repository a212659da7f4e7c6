use super::*;
use capture_wgc::{CaptureMode, Rect};
use overlay::OverlayResult;
use parking_lot::Mutex;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// How the fake encoder reports when told to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Report {
    Complete,
    Fail,
    Silent,
}

#[derive(Debug, Clone, Copy)]
struct Behavior {
    fail_configure: bool,
    fail_start: bool,
    bytes_on_stop: usize,
    report: Report,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            fail_configure: false,
            fail_start: false,
            bytes_on_stop: 1024,
            report: Report::Complete,
        }
    }
}

#[derive(Debug, Default)]
struct FakeLog {
    configured: Vec<EncoderParams>,
    calls: Vec<&'static str>,
}

#[derive(Clone, Default)]
struct FakeFactory {
    behavior: Behavior,
    log: Arc<Mutex<FakeLog>>,
}

struct FakeHandle {
    behavior: Behavior,
    log: Arc<Mutex<FakeLog>>,
    events: RecorderEvents,
    output: Option<PathBuf>,
}

impl RecorderFactory for FakeFactory {
    type Handle = FakeHandle;

    fn configure(&self, params: &EncoderParams, events: RecorderEvents) -> encoder::EncoderResult<FakeHandle> {
        if self.behavior.fail_configure {
            return Err(EncoderError::Rejected("no H.264 encoder".into()));
        }
        self.log.lock().configured.push(params.clone());
        Ok(FakeHandle {
            behavior: self.behavior,
            log: self.log.clone(),
            events,
            output: None,
        })
    }
}

impl RecorderHandle for FakeHandle {
    fn start(&mut self, output: &Path) -> encoder::EncoderResult<()> {
        self.log.lock().calls.push("start");
        if self.behavior.fail_start {
            return Err(EncoderError::Rejected("device busy".into()));
        }
        // Real encoders create the file up front.
        fs::write(output, b"")?;
        self.output = Some(output.to_path_buf());
        self.events.status(RecorderStatus::Recording);
        Ok(())
    }

    fn pause(&mut self) -> encoder::EncoderResult<()> {
        self.log.lock().calls.push("pause");
        Ok(())
    }

    fn resume(&mut self) -> encoder::EncoderResult<()> {
        self.log.lock().calls.push("resume");
        Ok(())
    }

    fn stop(&mut self) -> encoder::EncoderResult<()> {
        self.log.lock().calls.push("stop");
        let Some(path) = self.output.clone() else {
            return Ok(());
        };
        fs::write(&path, vec![0u8; self.behavior.bytes_on_stop])?;
        match self.behavior.report {
            Report::Complete => self.events.completed(path),
            Report::Fail => self.events.failed("encoder crashed"),
            Report::Silent => {}
        }
        Ok(())
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.log.lock().calls.push("release");
    }
}

#[derive(Debug, Default)]
struct FakeBorder {
    shown: Option<Rect>,
    paused: bool,
    closes: usize,
}

impl CaptureBorder for FakeBorder {
    fn show(&mut self, capture: Rect) -> OverlayResult<()> {
        self.shown = Some(capture);
        self.paused = false;
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn close(&mut self) {
        if self.shown.take().is_some() {
            self.closes += 1;
        }
    }

    fn is_visible(&self) -> bool {
        self.shown.is_some()
    }
}

struct Harness {
    controller: RecordingController<FakeFactory, FakeBorder>,
    log: Arc<Mutex<FakeLog>>,
    dir: TempDir,
}

impl Harness {
    fn new(behavior: Behavior) -> Self {
        Self::with_timeout(behavior, Duration::from_secs(2))
    }

    fn with_timeout(behavior: Behavior, finalize_timeout: Duration) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let factory = FakeFactory {
            behavior,
            log: Arc::default(),
        };
        let log = factory.log.clone();
        let settings = ControllerSettings {
            finalize_timeout,
            cancel_timeout: Duration::from_millis(100),
            settle_delay: Duration::ZERO,
            save_retry: RetryPolicy::default(),
            default_folder: Some(dir.path().join("Videos")),
            temp_dir: Some(dir.path().join("work")),
        };
        Self {
            controller: RecordingController::new(factory, FakeBorder::default(), settings),
            log,
            dir,
        }
    }

    fn work_files(&self) -> usize {
        fs::read_dir(self.dir.path().join("work"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    fn calls(&self) -> Vec<&'static str> {
        self.log.lock().calls.clone()
    }
}

fn region(width: u32, height: u32) -> RecordingRegion {
    RecordingRegion::new(Rect::new(100, 50, width, height), CaptureMode::Region)
}

#[test]
fn test_fresh_controller_is_idle() {
    let harness = Harness::new(Behavior::default());
    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert_eq!(harness.controller.duration(), Duration::ZERO);
    assert!(!harness.controller.is_paused());
    assert!(harness.controller.last_error().is_none());
}

#[test]
fn test_start_recording_shows_border_over_capture() {
    let mut harness = Harness::new(Behavior::default());
    harness
        .controller
        .start_recording(region(641, 481))
        .expect("start");

    assert_eq!(harness.controller.state(), RecordingState::Recording);
    // Region sizes are aligned down to even numbers.
    assert_eq!(harness.controller.border().shown, Some(Rect::new(100, 50, 640, 480)));
    assert_eq!(harness.calls(), vec!["start"]);
    assert_eq!(harness.work_files(), 1);
}

#[test]
fn test_second_start_is_rejected() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.start_recording(region(200, 200)).expect("first start");

    let err = harness
        .controller
        .start_recording(region(300, 300))
        .expect_err("second start");

    assert!(matches!(err, ControllerError::AlreadyInProgress));
    assert!(err.to_string().contains("already in progress"));
    assert_eq!(harness.controller.state(), RecordingState::Recording);
    assert_eq!(harness.log.lock().configured.len(), 1);
}

#[test]
fn test_invalid_region_is_rejected() {
    let mut harness = Harness::new(Behavior::default());
    assert!(harness.controller.begin_selection());

    let err = harness
        .controller
        .start_recording(region(5, 100))
        .expect_err("tiny region");

    assert!(matches!(err, ControllerError::InvalidRegion { width: 5, height: 100 }));
    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert!(harness.log.lock().configured.is_empty());
    assert!(harness.controller.last_error().is_some());
}

#[test]
fn test_start_from_selecting() {
    let mut harness = Harness::new(Behavior::default());
    assert!(harness.controller.begin_selection());
    assert!(!harness.controller.begin_selection(), "already selecting");

    harness.controller.start_recording(region(200, 200)).expect("start");
    assert_eq!(harness.controller.state(), RecordingState::Recording);
}

#[test]
fn test_cancel_selection_returns_to_idle() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.begin_selection();
    harness.controller.cancel_selection();
    assert_eq!(harness.controller.state(), RecordingState::Idle);
}

#[test]
fn test_configure_failure_leaves_nothing_behind() {
    let mut harness = Harness::new(Behavior {
        fail_configure: true,
        ..Behavior::default()
    });

    let err = harness
        .controller
        .start_recording(region(200, 200))
        .expect_err("configure fails");

    assert!(err.to_string().contains("no H.264 encoder"));
    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert!(!harness.controller.border().is_visible());
    assert_eq!(harness.work_files(), 0);
}

#[test]
fn test_start_failure_releases_recorder() {
    let mut harness = Harness::new(Behavior {
        fail_start: true,
        ..Behavior::default()
    });

    harness
        .controller
        .start_recording(region(200, 200))
        .expect_err("start fails");

    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert_eq!(harness.calls(), vec!["start", "release"]);
    assert_eq!(harness.work_files(), 0);
    assert_eq!(harness.controller.last_error(), Some("Could not start recording: Encoder rejected the configuration: device busy"));
}

#[test]
fn test_pause_and_resume_are_noops_when_not_applicable() {
    let mut harness = Harness::new(Behavior::default());
    assert!(!harness.controller.pause(), "pause while idle");
    assert!(!harness.controller.resume(), "resume while idle");

    harness.controller.start_recording(region(200, 200)).expect("start");
    assert!(!harness.controller.resume(), "resume while not paused");
    assert!(harness.calls().iter().all(|c| *c != "resume"));
}

#[test]
fn test_pause_dims_border_and_resume_restores() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.start_recording(region(200, 200)).expect("start");

    assert!(harness.controller.pause());
    assert!(harness.controller.is_paused());
    assert!(harness.controller.border().paused);
    assert!(!harness.controller.pause(), "second pause is a no-op");

    assert!(harness.controller.toggle_pause());
    assert!(!harness.controller.is_paused());
    assert!(!harness.controller.border().paused);
    assert_eq!(harness.calls(), vec!["start", "pause", "resume"]);
}

#[test]
fn test_stop_returns_result() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.start_recording(region(200, 200)).expect("start");

    let result = harness.controller.stop_recording().expect("recording result");

    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert!(!harness.controller.border().is_visible());
    assert_eq!(harness.controller.border().closes, 1);
    assert!(result.temp_file.exists());
    assert!(result.suggested_file_name.ends_with(".mp4"));
    assert_eq!(result.default_folder, harness.dir.path().join("Videos"));
    assert_eq!(harness.calls(), vec!["start", "stop", "release"]);
    assert_eq!(harness.controller.duration(), Duration::ZERO);
}

#[test]
fn test_stop_when_idle_returns_none() {
    let mut harness = Harness::new(Behavior::default());
    assert!(harness.controller.stop_recording().is_none());
    assert!(harness.controller.last_error().is_none());
}

#[test]
fn test_empty_output_is_discarded() {
    let mut harness = Harness::new(Behavior {
        bytes_on_stop: 0,
        ..Behavior::default()
    });
    harness.controller.start_recording(region(200, 200)).expect("start");

    assert!(harness.controller.stop_recording().is_none());
    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert!(harness.controller.last_error().is_some());
    assert_eq!(harness.work_files(), 0, "empty temp file should be deleted");
}

#[test]
fn test_backend_failure_surfaces_error() {
    let mut harness = Harness::new(Behavior {
        report: Report::Fail,
        ..Behavior::default()
    });
    harness.controller.start_recording(region(200, 200)).expect("start");

    assert!(harness.controller.stop_recording().is_none());
    assert_eq!(harness.controller.last_error(), Some("Recording failed: encoder crashed"));
    assert_eq!(harness.work_files(), 0);
}

#[test]
fn test_finalize_timeout_keeps_written_file() {
    let mut harness = Harness::with_timeout(
        Behavior {
            report: Report::Silent,
            ..Behavior::default()
        },
        Duration::from_millis(50),
    );
    harness.controller.start_recording(region(200, 200)).expect("start");

    let result = harness.controller.stop_recording().expect("file is still usable");
    assert_eq!(fs::metadata(&result.temp_file).expect("metadata").len(), 1024);
    assert_eq!(harness.controller.state(), RecordingState::Idle);
}

#[test]
fn test_stop_phases_across_threads() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.start_recording(region(200, 200)).expect("start");

    let pending = harness.controller.begin_stop().expect("pending stop");
    assert_eq!(harness.controller.state(), RecordingState::Stopping);
    assert!(harness.controller.begin_stop().is_none());
    assert!(matches!(
        harness.controller.start_recording(region(200, 200)),
        Err(ControllerError::AlreadyInProgress)
    ));

    let outcome = thread::spawn(move || pending.finish())
        .join()
        .expect("finish thread");
    assert_eq!(outcome.output_len, 1024);

    let result = harness.controller.complete_stop(outcome);
    assert!(result.is_some());
    assert_eq!(harness.controller.state(), RecordingState::Idle);
}

#[test]
fn test_cancel_discards_recording() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.start_recording(region(200, 200)).expect("start");

    harness.controller.cancel_recording();

    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert!(!harness.controller.border().is_visible());
    assert_eq!(harness.work_files(), 0);
    assert!(harness.controller.last_error().is_none());
}

#[test]
fn test_restart_reuses_last_region() {
    let mut harness = Harness::new(Behavior::default());
    assert!(matches!(
        harness.controller.restart_recording(),
        Err(ControllerError::NothingToRestart)
    ));

    harness.controller.start_recording(region(400, 300)).expect("start");
    harness.controller.restart_recording().expect("restart");

    assert_eq!(harness.controller.state(), RecordingState::Recording);
    let log = harness.log.lock();
    assert_eq!(log.configured.len(), 2);
    assert_eq!(log.configured[0].capture, log.configured[1].capture);
    drop(log);
    // First session cancelled, second one live.
    assert_eq!(harness.work_files(), 1);
}

#[test]
fn test_wide_capture_is_scaled_for_encoder() {
    let mut harness = Harness::new(Behavior::default());
    let wide = RecordingRegion::new(Rect::new(0, 0, 5120, 2880), CaptureMode::FullScreen);
    harness.controller.start_recording(wide).expect("start");

    let log = harness.log.lock();
    let params = &log.configured[0];
    assert_eq!((params.output_width, params.output_height), (4096, 2304));
    assert_eq!(params.quality.bitrate, 20_000_000);
    assert!(!params.quality.hardware);
}

#[test]
fn test_mid_recording_failure_is_torn_down() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.start_recording(region(200, 200)).expect("start");
    assert!(harness.controller.check_recorder().is_none());

    let events = harness
        .controller
        .session
        .as_ref()
        .map(|s| s.events.clone())
        .expect("active session");
    events.failed("GPU device removed");

    let message = harness.controller.check_recorder().expect("failure surfaced");
    assert!(message.contains("GPU device removed"));
    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert_eq!(harness.controller.last_error(), Some(message.as_str()));
    assert_eq!(harness.work_files(), 0);
}

#[test]
fn test_failure_survives_finishing_status() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.start_recording(region(200, 200)).expect("start");

    let events = harness
        .controller
        .session
        .as_ref()
        .map(|s| s.events.clone())
        .expect("active session");
    // The capture loop winds down after the encoder thread reported.
    events.failed("transcode failed");
    events.status(RecorderStatus::Finishing);

    let message = harness.controller.check_recorder().expect("failure surfaced");
    assert!(message.contains("transcode failed"));
    assert_eq!(harness.controller.state(), RecordingState::Idle);
}

#[test]
fn test_dropped_stop_is_recovered_by_cancel() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.start_recording(region(200, 200)).expect("start");

    let pending = harness.controller.begin_stop().expect("pending stop");
    assert!(!harness.controller.stop_abandoned());
    drop(pending);
    assert!(harness.controller.stop_abandoned());

    harness.controller.cancel_recording();
    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert_eq!(harness.work_files(), 0);
    assert!(harness.controller.take_last_error().is_some());

    harness.controller.start_recording(region(200, 200)).expect("start again");
    assert_eq!(harness.controller.state(), RecordingState::Recording);
}

#[test]
fn test_abort_stop_only_applies_while_stopping() {
    let mut harness = Harness::new(Behavior::default());
    assert!(!harness.controller.abort_stop());

    harness.controller.start_recording(region(200, 200)).expect("start");
    assert!(!harness.controller.abort_stop());

    drop(harness.controller.begin_stop());
    assert!(harness.controller.abort_stop());
    assert_eq!(harness.controller.state(), RecordingState::Idle);
    assert!(!harness.controller.border().is_visible());
    assert_eq!(harness.work_files(), 0);
}

#[test]
fn test_cancel_leaves_live_stop_alone() {
    let mut harness = Harness::new(Behavior::default());
    harness.controller.start_recording(region(200, 200)).expect("start");

    let pending = harness.controller.begin_stop().expect("pending stop");
    harness.controller.cancel_recording();
    assert_eq!(harness.controller.state(), RecordingState::Stopping);

    // Outcome still holds the stop alive until it is handed back.
    let outcome = pending.finish();
    assert!(!harness.controller.stop_abandoned());
    let result = harness.controller.complete_stop(outcome).expect("result");
    assert!(result.temp_file.exists());
    assert_eq!(harness.controller.state(), RecordingState::Idle);
}
