//! H.264 backend built on `windows_capture::encoder::VideoEncoder`
//!
//! A worker thread pulls frames from `capture_wgc::CaptureController`, paces
//! them to the policy frame rate and hands them to the encoder as
//! bottom-up BGRA buffers. Frames are skipped while paused; stop calls
//! `finish()`, which blocks until the MP4 is flushed.

use crate::recorder::{RecorderEvents, RecorderFactory, RecorderHandle, RecorderStatus, StartGate};
use crate::{EncoderError, EncoderParams, EncoderResult};
use capture_wgc::{monitor_crop_for, CaptureController, FrameData, MonitorCrop};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use windows::Win32::System::WinRT::{RoInitialize, RoUninitialize, RO_INIT_MULTITHREADED};
use windows_capture::encoder::{
    AudioSettingsBuilder, ContainerSettingsBuilder, VideoEncoder, VideoSettingsBuilder,
    VideoSettingsSubType,
};

/// How long `start` waits for the worker to bring up capture and encoder.
const START_TIMEOUT: Duration = Duration::from_secs(10);

enum WorkerCommand {
    Pause,
    Resume,
    Stop,
}

/// Builds `VideoEncoder` recorder sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct TranscoderFactory;

impl RecorderFactory for TranscoderFactory {
    type Handle = TranscoderHandle;

    fn configure(&self, params: &EncoderParams, events: RecorderEvents) -> EncoderResult<TranscoderHandle> {
        // Resolve the monitor now so a bad rectangle fails the start call.
        let target = monitor_crop_for(&params.capture)?;
        log::info!(
            "Configured recorder: {:?} on monitor {:?} -> {}x{}",
            target.crop,
            target.monitor,
            params.output_width,
            params.output_height
        );

        Ok(TranscoderHandle {
            params: params.clone(),
            target,
            events,
            gate: StartGate::new(),
            commands: None,
            worker: None,
        })
    }
}

pub struct TranscoderHandle {
    params: EncoderParams,
    target: MonitorCrop,
    events: RecorderEvents,
    /// Abandoned when `start` gives up on a worker that has not reported ready.
    gate: StartGate,
    commands: Option<Sender<WorkerCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl TranscoderHandle {
    fn send(&self, command: WorkerCommand) -> EncoderResult<()> {
        if let Some(tx) = &self.commands {
            // A closed channel means the worker already ended and reported.
            let _ = tx.send(command);
        }
        Ok(())
    }
}

impl RecorderHandle for TranscoderHandle {
    fn start(&mut self, output: &Path) -> EncoderResult<()> {
        if self.worker.is_some() || self.commands.is_some() {
            return Err(EncoderError::AlreadyStarted);
        }

        let (cmd_tx, cmd_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        let job = WorkerJob {
            params: self.params.clone(),
            target: self.target,
            output: output.to_path_buf(),
            events: self.events.clone(),
            gate: self.gate.clone(),
        };
        let worker = thread::Builder::new()
            .name("screenrec-encoder".into())
            .spawn(move || job.run(cmd_rx, ready_tx))?;

        match ready_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(())) => {
                self.commands = Some(cmd_tx);
                self.worker = Some(worker);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) => {
                // The worker checks this before and after creating the file.
                self.gate.abandon();
                let _ = cmd_tx.send(WorkerCommand::Stop);
                Err(EncoderError::Timeout("encoder start"))
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = worker.join();
                Err(EncoderError::Rejected("encoder worker exited during start".into()))
            }
        }
    }

    fn pause(&mut self) -> EncoderResult<()> {
        self.send(WorkerCommand::Pause)
    }

    fn resume(&mut self) -> EncoderResult<()> {
        self.send(WorkerCommand::Resume)
    }

    fn stop(&mut self) -> EncoderResult<()> {
        self.send(WorkerCommand::Stop)
    }
}

impl Drop for TranscoderHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.commands.take() {
            let _ = tx.send(WorkerCommand::Stop);
        }
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            } else {
                log::warn!("Encoder worker still running at release; detaching");
            }
        }
    }
}

struct WorkerJob {
    params: EncoderParams,
    target: MonitorCrop,
    output: PathBuf,
    events: RecorderEvents,
    gate: StartGate,
}

impl WorkerJob {
    fn run(self, commands: Receiver<WorkerCommand>, ready: Sender<EncoderResult<()>>) {
        if let Err(e) = unsafe { RoInitialize(RO_INIT_MULTITHREADED) } {
            let _ = ready.send(Err(e.into()));
            return;
        }

        match self.setup() {
            Ok(Some((mut capture, encoder))) => {
                // A closed ready channel means `start` already timed out.
                if ready.send(Ok(())).is_err() {
                    capture.stop();
                    self.gate.abandon();
                    let _ = self.gate.release_if_abandoned(encoder, &self.output);
                } else {
                    self.events.status(RecorderStatus::Recording);
                    self.capture_loop(capture, encoder, commands);
                }
            }
            Ok(None) => log::debug!("Encoder start abandoned; worker exiting"),
            Err(e) => {
                let _ = ready.send(Err(e));
            }
        }

        unsafe {
            RoUninitialize();
        }
    }

    /// Bring up capture, then the encoder. Returns `None` when the handle
    /// stopped waiting; no output file is left behind in that case.
    fn setup(&self) -> EncoderResult<Option<(CaptureController, VideoEncoder)>> {
        let mut capture = CaptureController::new()?;
        capture.start(&self.target)?;

        if self.gate.is_abandoned() {
            capture.stop();
            return Ok(None);
        }

        let encoder = create_encoder(&self.params, &self.output)?;

        match self.gate.release_if_abandoned(encoder, &self.output) {
            Some(encoder) => Ok(Some((capture, encoder))),
            None => {
                capture.stop();
                Ok(None)
            }
        }
    }

    fn capture_loop(
        &self,
        mut capture: CaptureController,
        mut encoder: VideoEncoder,
        commands: Receiver<WorkerCommand>,
    ) {
        let interval = Duration::from_secs(1) / self.params.quality.frame_rate.max(1);
        let capture_size = (self.params.capture.width, self.params.capture.height);
        let output_size = (self.params.output_width, self.params.output_height);
        let scaled = self.params.is_scaled();

        let mut paused = false;
        let mut next_due = Instant::now();
        let mut frame_index: u32 = 0;
        let mut latest: Option<FrameData> = None;

        loop {
            match commands.try_recv() {
                Ok(WorkerCommand::Pause) => {
                    paused = true;
                    self.events.status(RecorderStatus::Paused);
                }
                Ok(WorkerCommand::Resume) => {
                    paused = false;
                    next_due = Instant::now();
                    self.events.status(RecorderStatus::Recording);
                }
                Ok(WorkerCommand::Stop) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            // WGC only delivers on change; keep the last frame to hold the rate.
            if let Some(frame) = capture.try_get_frame() {
                latest = Some(frame);
            }

            let now = Instant::now();
            if !paused && now >= next_due {
                if let Some(frame) = &latest {
                    let mut sample = frame.fit_to(capture_size.0, capture_size.1);
                    if scaled {
                        sample = sample.scale_to(output_size.0, output_size.1);
                    }
                    // The encoder reads uncompressed RGB bottom-up.
                    sample.flip_vertical();
                    let timestamp = to_ticks(interval * frame_index);
                    if let Err(e) = encoder.send_frame_buffer(&sample.data, timestamp) {
                        capture.stop();
                        self.events.failed(format!("Encoding failed: {}", e));
                        return;
                    }
                    frame_index += 1;
                }
                next_due += interval;
                if next_due < now {
                    next_due = now + interval;
                }
            }

            thread::sleep(Duration::from_millis(1));
        }

        self.events.status(RecorderStatus::Finishing);
        capture.stop();
        log::debug!("Capture loop ended after {} frames", frame_index);

        match encoder.finish() {
            Ok(()) => self.events.completed(self.output.clone()),
            Err(e) => self.events.failed(format!("Encoding failed: {}", e)),
        }
    }
}

fn create_encoder(params: &EncoderParams, output: &Path) -> EncoderResult<VideoEncoder> {
    if !params.quality.hardware {
        // VideoEncoder picks the Media Foundation transform itself.
        log::info!(
            "Software encoding requested for {}x{}; deferring to the system encoder",
            params.output_width,
            params.output_height
        );
    }

    let video = VideoSettingsBuilder::new(params.output_width, params.output_height)
        .sub_type(VideoSettingsSubType::H264)
        .bitrate(params.quality.bitrate)
        .frame_rate(params.quality.frame_rate);

    VideoEncoder::new(
        video,
        AudioSettingsBuilder::default().disabled(true),
        ContainerSettingsBuilder::default(),
        output,
    )
    .map_err(|e| EncoderError::Backend(e.to_string()))
}

/// Media Foundation timestamps are in 100 ns units.
fn to_ticks(offset: Duration) -> i64 {
    (offset.as_nanos() / 100) as i64
}
