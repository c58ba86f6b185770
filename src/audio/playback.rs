use std::path::{Path, PathBuf};

use crate::error::PlaybackError;

/// A loaded, ready-to-play recording.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    pub path: PathBuf,
    /// Decoded duration in seconds, if the container reports one
    pub duration_secs: Option<f64>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Audio playback backend trait
///
/// Load and play are separate, sequentially awaited steps: `load` surfaces
/// decode/probe errors before any audio is produced, and `play` resolves when
/// playback finishes (or fails partway through).
#[async_trait::async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Open and probe the file at `path`, surfacing load/decode errors.
    async fn load(&mut self, path: &Path) -> Result<PlaybackHandle, PlaybackError>;

    /// Play a loaded recording to completion.
    async fn play(&mut self, handle: PlaybackHandle) -> Result<(), PlaybackError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
