//! H.264 recording boundary for ScreenRec
//!
//! Holds the capture/encoder policy, the recorder traits the controller drives,
//! the single-shot completion signal, and the output-file helpers. The
//! `windows-capture` backend is only built on Windows.

pub mod output;
pub mod policy;
pub mod recorder;
pub mod signal;

#[cfg(windows)]
pub mod transcoder;

pub use output::{RetryPolicy, VIDEO_EXTENSION};
pub use policy::{EncoderParams, QualityPolicy, MAX_ENCODER_WIDTH};
pub use recorder::{RecorderEvents, RecorderFactory, RecorderHandle, RecorderStatus, StartGate};
pub use signal::{CompletionSignal, RecorderOutcome};
#[cfg(windows)]
pub use transcoder::TranscoderFactory;

use capture_wgc::{CaptureError, Rect};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Windows(#[from] windows::core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid capture region {0:?}")]
    InvalidRegion(Rect),

    #[error("Video encoder error: {0}")]
    Backend(String),

    #[error("Encoder rejected the configuration: {0}")]
    Rejected(String),

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Recorder already started")]
    AlreadyStarted,

    #[error("Could not save to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type EncoderResult<T> = Result<T, EncoderError>;
