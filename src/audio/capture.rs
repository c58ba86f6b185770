use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::error::CaptureError;
use crate::session::RecordingOutcome;

/// Encoder settings handed to the capture backend at prepare time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Encoder quality hint
    pub quality: EncoderQuality,
    /// Target encoding
    pub encoding: Encoding,
    /// Encoder bit rate in bits per second
    pub bit_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderQuality {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Aac,
    Wav,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            sample_rate: 22050, // voice-memo rate
            channels: 1,        // Mono
            quality: EncoderQuality::Low,
            encoding: Encoding::Aac,
            bit_rate: 32000,
        }
    }
}

/// Progress tick delivered by a capture backend while recording.
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    /// Seconds of audio captured so far (fractional)
    pub current_time: f64,
}

/// Audio capture backend trait
///
/// Implementations wrap whatever the platform provides for microphone
/// capture-to-file. Native APIs disagree on how the terminal "recording
/// finished" signal is delivered (completion callback on one platform family,
/// the stop call's return value on the other); adapters must normalize both
/// into the return value of [`stop`](CaptureBackend::stop), so the event
/// channel carries progress ticks only and callers never branch on platform.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Ask the platform for microphone permission. Suspends until the user
    /// answers; the answer is stable for the process lifetime.
    async fn request_authorization(&mut self) -> Result<bool, CaptureError>;

    /// Arm the backend to record into `path` with the given settings.
    ///
    /// Returns a channel receiver that will receive progress ticks once
    /// capture starts. Calling `prepare` again re-arms the backend and
    /// replaces any previous tick stream.
    async fn prepare(
        &mut self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> Result<mpsc::Receiver<ProgressUpdate>, CaptureError>;

    /// Start capturing into the prepared path.
    async fn start(&mut self) -> Result<(), CaptureError>;

    /// Pause an in-progress capture.
    async fn pause(&mut self) -> Result<(), CaptureError>;

    /// Resume a paused capture.
    async fn resume(&mut self) -> Result<(), CaptureError>;

    /// Stop capturing and finalize the file.
    ///
    /// The returned outcome is the single authoritative completion signal.
    async fn stop(&mut self) -> Result<RecordingOutcome, CaptureError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Where a capture backend writes its working file.
#[derive(Debug, Clone)]
pub struct WorkingFile {
    pub path: PathBuf,
}

impl WorkingFile {
    /// Build the working path: a single fixed file in the output directory,
    /// overwritten on each new recording.
    pub fn in_dir(dir: impl AsRef<Path>, stem: &str, encoding: Encoding) -> Self {
        let ext = match encoding {
            Encoding::Aac => "aac",
            Encoding::Wav => "wav",
        };
        Self {
            path: dir.as_ref().join(format!("{stem}.{ext}")),
        }
    }
}
