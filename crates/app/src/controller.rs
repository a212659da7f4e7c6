//! Recording controller
//!
//! Owns the recording state machine, the active recorder handle, the
//! recording clock and the capture border. Everything here runs on the UI
//! thread except `PendingStop::finish`, which blocks and may be moved to a
//! worker thread.

use crate::state::{RecordingResult, RecordingState};
use crate::timing::DurationTracker;
use capture_wgc::RecordingRegion;
use chrono::Local;
use encoder::output::{self, discard, output_len};
use encoder::{
    EncoderError, EncoderParams, RecorderEvents, RecorderFactory, RecorderHandle,
    RecorderOutcome, RecorderStatus, RetryPolicy,
};
use overlay::CaptureBorder;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Errors surfaced by `start_recording`. `Display` is the user-facing text.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("A recording is already in progress")]
    AlreadyInProgress,

    #[error("The selected area ({width}x{height}) is too small to record")]
    InvalidRegion { width: u32, height: u32 },

    #[error("Could not start recording: {0}")]
    Encoder(#[from] EncoderError),

    #[error("There is no previous region to record again")]
    NothingToRestart,
}

/// Timing knobs for the stop path
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// How long to wait for the encoder to finalize a stopped recording.
    pub finalize_timeout: Duration,
    /// Same, for a cancelled recording whose file is thrown away.
    pub cancel_timeout: Duration,
    /// Pause after releasing the recorder before the file is inspected.
    pub settle_delay: Duration,
    pub save_retry: RetryPolicy,
    /// Save dialog start folder; falls back to the user's Videos folder.
    pub default_folder: Option<PathBuf>,
    /// Working directory for temp files; falls back to `%TEMP%/screenrec`.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            finalize_timeout: Duration::from_secs(120),
            cancel_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_millis(500),
            save_retry: RetryPolicy::default(),
            default_folder: None,
            temp_dir: None,
        }
    }
}

struct ActiveSession<H> {
    handle: H,
    events: RecorderEvents,
    temp_file: PathBuf,
}

/// A recording that has been told to stop but not yet finalized
pub struct PendingStop<H> {
    handle: H,
    events: RecorderEvents,
    temp_file: PathBuf,
    duration: Duration,
    timeout: Duration,
    settle_delay: Duration,
    /// Alive while the stop is in flight; carried over into the outcome.
    in_flight: Arc<()>,
}

/// What `PendingStop::finish` found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopOutcome {
    pub temp_file: PathBuf,
    pub duration: Duration,
    /// `None` when the recorder never reported back within the timeout.
    pub recorder: Option<RecorderOutcome>,
    pub output_len: u64,
    in_flight: Arc<()>,
}

impl<H: RecorderHandle> PendingStop<H> {
    /// Wait for the recorder, release it and inspect the output file.
    pub fn finish(self) -> StopOutcome {
        let PendingStop {
            handle,
            events,
            temp_file,
            duration,
            timeout,
            settle_delay,
            in_flight,
        } = self;

        let recorder = events.wait_for_completion(timeout);
        if recorder.is_none() {
            log::warn!(
                "Recorder did not finish within {:?}; continuing with the file as is",
                timeout
            );
        }

        // Releasing the handle frees the encoder's hold on the file.
        drop(handle);
        if !settle_delay.is_zero() {
            thread::sleep(settle_delay);
        }

        let output_len = output_len(&temp_file);
        log::debug!("Recording output {} is {} bytes", temp_file.display(), output_len);

        StopOutcome {
            temp_file,
            duration,
            recorder,
            output_len,
            in_flight,
        }
    }
}

pub struct RecordingController<F: RecorderFactory, B: CaptureBorder> {
    factory: F,
    border: B,
    settings: ControllerSettings,
    state: RecordingState,
    session: Option<ActiveSession<F::Handle>>,
    clock: DurationTracker,
    last_region: Option<RecordingRegion>,
    last_error: Option<String>,
    /// The file and liveness of the stop begun by `begin_stop`.
    stopping: Option<(PathBuf, Weak<()>)>,
}

impl<F: RecorderFactory, B: CaptureBorder> RecordingController<F, B> {
    pub fn new(factory: F, border: B, settings: ControllerSettings) -> Self {
        Self {
            factory,
            border,
            settings,
            state: RecordingState::Idle,
            session: None,
            clock: DurationTracker::new(),
            last_region: None,
            last_error: None,
            stopping: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Recorded time so far, paused intervals excluded.
    pub fn duration(&self) -> Duration {
        self.clock.elapsed(Instant::now())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    pub fn last_region(&self) -> Option<&RecordingRegion> {
        self.last_region.as_ref()
    }

    pub fn border(&self) -> &B {
        &self.border
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ControllerSettings) {
        self.settings = settings;
    }

    /// Idle -> Selecting. The caller hides its UI and shows the overlay.
    pub fn begin_selection(&mut self) -> bool {
        if self.state != RecordingState::Idle {
            return false;
        }
        self.state = RecordingState::Selecting;
        log::info!("Selecting capture area");
        true
    }

    /// Selecting -> Idle
    pub fn cancel_selection(&mut self) {
        if self.state == RecordingState::Selecting {
            self.state = RecordingState::Idle;
            log::info!("Selection cancelled");
        }
    }

    /// Configure and launch the recorder for `region`.
    ///
    /// Accepted from Idle and Selecting. Any failure leaves the controller
    /// Idle with nothing allocated.
    pub fn start_recording(&mut self, region: RecordingRegion) -> Result<(), ControllerError> {
        if matches!(self.state, RecordingState::Recording | RecordingState::Stopping) {
            log::warn!("Start ignored: already {:?}", self.state);
            return Err(ControllerError::AlreadyInProgress);
        }

        let (session, params) = match self.launch(&region) {
            Ok(launched) => launched,
            Err(e) => {
                log::error!("Failed to start recording {}: {}", region.describe(), e);
                self.state = RecordingState::Idle;
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        if let Err(e) = self.border.show(params.capture) {
            log::warn!("Recording without a border: {}", e);
        }

        log::info!(
            "Recording {} -> {}x{} ({} bps, {} fps, {})",
            region.describe(),
            params.output_width,
            params.output_height,
            params.quality.bitrate,
            params.quality.frame_rate,
            if params.quality.hardware { "hardware" } else { "software" }
        );

        self.clock.start(Instant::now());
        self.session = Some(session);
        self.last_region = Some(region);
        self.last_error = None;
        self.state = RecordingState::Recording;
        Ok(())
    }

    fn launch(
        &mut self,
        region: &RecordingRegion,
    ) -> Result<(ActiveSession<F::Handle>, EncoderParams), ControllerError> {
        if !region.is_valid() {
            return Err(ControllerError::InvalidRegion {
                width: region.rect.width,
                height: region.rect.height,
            });
        }

        let params = EncoderParams::for_region(region)?;
        let temp_file = match &self.settings.temp_dir {
            Some(dir) => output::temp_output_path_in(dir)?,
            None => output::temp_output_path()?,
        };

        let events = RecorderEvents::new();
        let mut handle = match self.factory.configure(&params, events.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                discard(&temp_file);
                return Err(e.into());
            }
        };

        if let Err(e) = handle.start(&temp_file) {
            drop(handle);
            discard(&temp_file);
            return Err(e.into());
        }

        Ok((
            ActiveSession {
                handle,
                events,
                temp_file,
            },
            params,
        ))
    }

    /// No-op unless recording and not already paused.
    pub fn pause(&mut self) -> bool {
        if self.state != RecordingState::Recording || self.clock.is_paused() {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if let Err(e) = session.handle.pause() {
            log::warn!("Recorder refused to pause: {}", e);
            return false;
        }

        self.clock.pause(Instant::now());
        self.border.set_paused(true);
        log::info!("Recording paused");
        true
    }

    /// No-op unless recording and paused.
    pub fn resume(&mut self) -> bool {
        if self.state != RecordingState::Recording || !self.clock.is_paused() {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if let Err(e) = session.handle.resume() {
            log::warn!("Recorder refused to resume: {}", e);
            return false;
        }

        self.clock.resume(Instant::now());
        self.border.set_paused(false);
        log::info!("Recording resumed");
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.clock.is_paused() {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Recording -> Stopping. Signals the recorder and tears down the border;
    /// the returned value does the blocking part.
    pub fn begin_stop(&mut self) -> Option<PendingStop<F::Handle>> {
        if self.state != RecordingState::Recording {
            return None;
        }

        let duration = self.clock.stop(Instant::now());
        self.border.close();

        let Some(ActiveSession {
            mut handle,
            events,
            temp_file,
        }) = self.session.take()
        else {
            log::error!("Recording state without a recorder; resetting");
            self.state = RecordingState::Idle;
            return None;
        };

        let in_flight = Arc::new(());
        self.stopping = Some((temp_file.clone(), Arc::downgrade(&in_flight)));
        self.state = RecordingState::Stopping;
        if let Err(e) = handle.stop() {
            log::warn!("Recorder did not accept stop: {}", e);
        }
        log::info!("Stopping recording after {:.1}s", duration.as_secs_f64());

        Some(PendingStop {
            handle,
            events,
            temp_file,
            duration,
            timeout: self.settings.finalize_timeout,
            settle_delay: self.settings.settle_delay,
            in_flight,
        })
    }

    /// True when the controller is stopping but the `PendingStop` and its
    /// outcome are both gone, so `complete_stop` can never arrive.
    pub fn stop_abandoned(&self) -> bool {
        self.state == RecordingState::Stopping
            && self
                .stopping
                .as_ref()
                .map_or(true, |(_, in_flight)| in_flight.strong_count() == 0)
    }

    /// Stopping -> Idle without an outcome. Used when the finalize step
    /// could not run; the temp file is discarded.
    pub fn abort_stop(&mut self) -> bool {
        if self.state != RecordingState::Stopping {
            return false;
        }
        if let Some((temp_file, _)) = self.stopping.take() {
            discard(&temp_file);
        }
        self.state = RecordingState::Idle;
        self.border.close();
        self.last_error = Some("The recording could not be finalized and was discarded".into());
        log::error!("Stop aborted before the recording was finalized");
        true
    }

    /// Stopping -> Idle. Returns the recording when the file is usable.
    pub fn complete_stop(&mut self, outcome: StopOutcome) -> Option<RecordingResult> {
        if self.state != RecordingState::Stopping {
            log::warn!("Stop completed while {:?}", self.state);
        }
        self.state = RecordingState::Idle;
        self.stopping = None;
        self.border.close();

        let StopOutcome {
            temp_file,
            duration,
            recorder,
            output_len,
            ..
        } = outcome;

        if let Some(RecorderOutcome::Failed(reason)) = recorder {
            discard(&temp_file);
            self.last_error = Some(format!("Recording failed: {}", reason));
            return None;
        }

        if output_len == 0 {
            log::error!("Recording output {} is empty", temp_file.display());
            discard(&temp_file);
            self.last_error = Some("The recording is empty, so there is nothing to save".into());
            return None;
        }

        log::info!("Recording finished: {:.1}s, {} bytes", duration.as_secs_f64(), output_len);
        Some(RecordingResult {
            temp_file,
            suggested_file_name: output::suggested_file_name(Local::now()),
            default_folder: self
                .settings
                .default_folder
                .clone()
                .unwrap_or_else(output::default_folder),
            duration,
        })
    }

    /// Stop, wait for the file and hand it over. `None` unless recording or
    /// when the output is unusable (see `last_error`).
    pub fn stop_recording(&mut self) -> Option<RecordingResult> {
        let pending = self.begin_stop()?;
        let outcome = pending.finish();
        self.complete_stop(outcome)
    }

    /// Stop and throw the recording away. Also recovers a stop whose
    /// finalize step was dropped.
    pub fn cancel_recording(&mut self) {
        if self.stop_abandoned() {
            self.abort_stop();
            return;
        }
        let Some(mut pending) = self.begin_stop() else {
            return;
        };
        pending.timeout = self.settings.cancel_timeout;

        let outcome = pending.finish();
        discard(&outcome.temp_file);
        self.state = RecordingState::Idle;
        self.stopping = None;
        self.border.close();
        log::info!("Recording cancelled");
    }

    /// Cancel the current recording (if any) and record the last region again.
    pub fn restart_recording(&mut self) -> Result<(), ControllerError> {
        let region = self
            .last_region
            .clone()
            .ok_or(ControllerError::NothingToRestart)?;
        self.cancel_recording();
        self.start_recording(region)
    }

    /// Tear down a recording whose backend failed mid-way. Returns the
    /// user-facing message when that happened.
    pub fn check_recorder(&mut self) -> Option<String> {
        if self.state != RecordingState::Recording {
            return None;
        }
        let session = self.session.as_ref()?;
        if session.events.current_status() != RecorderStatus::Failed {
            return None;
        }

        let reason = session
            .events
            .last_error()
            .unwrap_or_else(|| "unknown encoder error".to_string());
        self.cancel_recording();

        let message = format!("Recording failed: {}", reason);
        self.last_error = Some(message.clone());
        Some(message)
    }
}

impl<F: RecorderFactory, B: CaptureBorder> Drop for RecordingController<F, B> {
    fn drop(&mut self) {
        if self.state == RecordingState::Recording {
            log::warn!("Controller dropped while recording; discarding");
            self.cancel_recording();
        }
    }
}
