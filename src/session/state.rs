use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Discrete recording-session state.
///
/// A single enum instead of independent recording/paused/stopped flags, so
/// invalid combinations are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No recording has been made yet
    Idle,
    /// Capture is running
    Recording,
    /// Capture is paused; resumable
    Paused,
    /// A recording exists at the working path
    Stopped,
}

/// Microphone permission status. Set once at startup, stable afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authorization {
    Unknown,
    Granted,
    Denied,
}

/// Terminal record of a finished recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingOutcome {
    /// Whether the backend finalized the file cleanly
    pub succeeded: bool,

    /// Final file path
    pub path: PathBuf,

    /// Size of the finished file in bytes
    pub size_bytes: u64,

    /// When the recording finished
    pub finished_at: DateTime<Utc>,
}

/// The sole stateful entity: one recording session per process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub phase: Phase,

    /// Whole seconds captured so far. Non-decreasing while `Recording`,
    /// frozen otherwise, reset to 0 only when a new recording is prepared.
    pub elapsed_seconds: u64,

    /// Where the capture backend writes and the playback backend reads.
    /// Fixed for the lifetime of one prepared recording.
    pub working_path: PathBuf,

    pub authorized: Authorization,

    /// Populated when a recording finishes
    pub last_recording_outcome: Option<RecordingOutcome>,
}

impl Session {
    pub fn new(working_path: PathBuf) -> Self {
        Self {
            phase: Phase::Idle,
            elapsed_seconds: 0,
            working_path,
            authorized: Authorization::Unknown,
            last_recording_outcome: None,
        }
    }

    /// A new recording may be prepared only before the first recording or
    /// after the previous one stopped.
    pub fn can_prepare(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Stopped)
    }
}
