pub mod audio;
pub mod config;
pub mod error;
pub mod session;

pub use audio::{
    CaptureBackend, DecodePlayback, EncoderQuality, EncoderSettings, Encoding, PlaybackBackend,
    PlaybackHandle, ProgressUpdate, ToneCapture, WorkingFile,
};
pub use config::RecorderConfig;
pub use error::{CaptureError, PlaybackError, SessionError};
pub use session::{
    Authorization, Phase, RecordingOutcome, RecordingSessionController, Session, SessionEvent,
};
