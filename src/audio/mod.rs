pub mod capture;
pub mod decode;
pub mod playback;
pub mod tone;

pub use capture::{
    CaptureBackend, EncoderQuality, EncoderSettings, Encoding, ProgressUpdate, WorkingFile,
};
pub use decode::DecodePlayback;
pub use playback::{PlaybackBackend, PlaybackHandle};
pub use tone::ToneCapture;
