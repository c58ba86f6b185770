use std::path::PathBuf;
use thiserror::Error;

use crate::session::Phase;

/// Errors reported by capture backends.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("recorder is not prepared")]
    NotPrepared,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("failed to write recording to {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("backend call failed: {0}")]
    Backend(String),
}

/// Errors reported by playback backends.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to load or decode {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("playback failed: {0}")]
    Playback(String),
}

/// Session-level error taxonomy.
///
/// These never escape the controller: each intent handler recovers locally,
/// logs the error, and mirrors it to the observer channel.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no permission granted")]
    PermissionDenied,

    #[error("{intent} is not valid while {phase:?}")]
    InvalidTransition { intent: &'static str, phase: Phase },

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}
