// Playback backend built on symphonia. There is no audio device integration
// here: "playing" decodes the file end to end (surfacing decode failures the
// way a real output path would) and paces itself to the decoded duration.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::info;

use super::playback::{PlaybackBackend, PlaybackHandle};
use crate::error::PlaybackError;

pub struct DecodePlayback;

impl DecodePlayback {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DecodePlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PlaybackBackend for DecodePlayback {
    async fn load(&mut self, path: &Path) -> Result<PlaybackHandle, PlaybackError> {
        let path = path.to_path_buf();
        let probe_path = path.clone();

        // Probing is synchronous I/O; keep it off the runtime threads
        let handle = tokio::task::spawn_blocking(move || probe_file(&probe_path))
            .await
            .map_err(|e| PlaybackError::Playback(format!("probe task panicked: {e}")))??;

        info!(
            "Loaded {}: {}Hz, {} channels, {:?}s",
            handle.path.display(),
            handle.sample_rate,
            handle.channels,
            handle.duration_secs
        );

        Ok(handle)
    }

    async fn play(&mut self, handle: PlaybackHandle) -> Result<(), PlaybackError> {
        let path = handle.path.clone();

        let decoded_secs = tokio::task::spawn_blocking(move || decode_all(&path))
            .await
            .map_err(|e| PlaybackError::Playback(format!("decode task panicked: {e}")))??;

        // Pace to the decoded duration so play() resolves when a real output
        // device would have finished
        tokio::time::sleep(Duration::from_secs_f64(decoded_secs)).await;

        info!(
            "Finished playing {} ({:.1}s)",
            handle.path.display(),
            decoded_secs
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "decode"
    }
}

fn load_error(path: &Path, err: impl std::fmt::Display) -> PlaybackError {
    PlaybackError::Load {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Probe the container and report stream parameters without decoding.
fn probe_file(path: &Path) -> Result<PlaybackHandle, PlaybackError> {
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let file = File::open(path).map_err(|e| load_error(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| load_error(path, e))?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| load_error(path, "no playable audio track"))?;

    let params = &track.codec_params;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| load_error(path, "unknown sample rate"))?;
    let channels = params.channels.map(|c| c.count() as u16).unwrap_or(1);
    let duration_secs = params
        .n_frames
        .map(|frames| frames as f64 / sample_rate as f64);

    Ok(PlaybackHandle {
        path: path.to_path_buf(),
        duration_secs,
        sample_rate,
        channels,
    })
}

/// Decode the file end to end and return the decoded duration in seconds.
fn decode_all(path: &Path) -> Result<f64, PlaybackError> {
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let file = File::open(path).map_err(|e| load_error(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| load_error(path, e))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| load_error(path, "no playable audio track"))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| load_error(path, "unknown sample rate"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| load_error(path, e))?;

    let mut frames_decoded: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream surfaces as an IO error in symphonia
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => {
                return Err(PlaybackError::Playback(format!(
                    "packet read failed: {err}"
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                frames_decoded += decoded.frames() as u64;
            }
            // A corrupt packet is skippable; the stream may still recover
            Err(SymphoniaError::DecodeError(_)) | Err(SymphoniaError::IoError(_)) => continue,
            Err(err) => {
                return Err(PlaybackError::Playback(format!("decode failed: {err}")));
            }
        }
    }

    Ok(frames_decoded as f64 / sample_rate as f64)
}
