// Built-in capture backend: synthesizes a test tone into the working WAV file.
// Stands in for the native microphone collaborator on hosts without one.

use std::f64::consts::TAU;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::capture::{CaptureBackend, Encoding, EncoderSettings, ProgressUpdate};
use crate::error::CaptureError;
use crate::session::RecordingOutcome;

const TONE_HZ: f64 = 440.0;
const TONE_AMPLITUDE: f64 = 0.3;
const TICK: Duration = Duration::from_millis(250);

type WavWriter = hound::WavWriter<BufWriter<fs::File>>;

/// Capture backend that records a synthesized tone.
///
/// Real-time paced: one second of recording takes one second of wall clock,
/// and progress ticks arrive on the channel handed out by `prepare`.
pub struct ToneCapture {
    armed: Option<Armed>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    writer_task: Option<JoinHandle<Result<(), CaptureError>>>,
    path: Option<PathBuf>,
}

struct Armed {
    writer: WavWriter,
    settings: EncoderSettings,
    tick_tx: mpsc::Sender<ProgressUpdate>,
}

impl ToneCapture {
    pub fn new() -> Self {
        Self {
            armed: None,
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            writer_task: None,
            path: None,
        }
    }
}

impl Default for ToneCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ToneCapture {
    async fn request_authorization(&mut self) -> Result<bool, CaptureError> {
        // Nothing to ask for a synthetic source
        info!("Tone capture: authorization granted implicitly");
        Ok(true)
    }

    async fn prepare(
        &mut self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> Result<mpsc::Receiver<ProgressUpdate>, CaptureError> {
        if settings.encoding != Encoding::Wav {
            return Err(CaptureError::EncodingFailed(format!(
                "tone capture writes WAV only, got {:?}",
                settings.encoding
            )));
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| CaptureError::Storage {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let spec = hound::WavSpec {
            channels: settings.channels,
            sample_rate: settings.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(path, spec)
            .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;

        info!(
            "Tone capture armed: {} ({}Hz, {} channels)",
            path.display(),
            settings.sample_rate,
            settings.channels
        );

        let (tick_tx, tick_rx) = mpsc::channel(32);

        self.armed = Some(Armed {
            writer,
            settings: settings.clone(),
            tick_tx,
        });
        self.path = Some(path.to_path_buf());

        Ok(tick_rx)
    }

    async fn start(&mut self) -> Result<(), CaptureError> {
        let armed = self.armed.take().ok_or(CaptureError::NotPrepared)?;

        self.running.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);

        self.writer_task = Some(tokio::spawn(write_tone(armed, running, paused)));

        Ok(())
    }

    async fn pause(&mut self) -> Result<(), CaptureError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::Backend("not capturing".to_string()));
        }
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), CaptureError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::Backend("not capturing".to_string()));
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) -> Result<RecordingOutcome, CaptureError> {
        let path = self.path.clone().ok_or(CaptureError::NotPrepared)?;

        self.running.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);

        if let Some(task) = self.writer_task.take() {
            task.await
                .map_err(|e| CaptureError::Backend(format!("writer task panicked: {e}")))??;
        } else {
            // Stopped without ever starting: finalize the empty file
            if let Some(armed) = self.armed.take() {
                armed
                    .writer
                    .finalize()
                    .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;
            }
        }

        let size_bytes = fs::metadata(&path)
            .map_err(|e| CaptureError::Storage {
                path: path.clone(),
                source: e,
            })?
            .len();

        info!(
            "Tone capture stopped: {} ({} bytes)",
            path.display(),
            size_bytes
        );

        Ok(RecordingOutcome {
            succeeded: true,
            path,
            size_bytes,
            finished_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "tone"
    }
}

/// Writes tone samples in real time until `running` flips false, then
/// finalizes the WAV file.
async fn write_tone(
    armed: Armed,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
) -> Result<(), CaptureError> {
    let Armed {
        mut writer,
        settings,
        tick_tx,
    } = armed;

    let samples_per_tick =
        (settings.sample_rate as f64 * TICK.as_secs_f64()) as usize;
    let mut sample_index: u64 = 0;

    let mut interval = tokio::time::interval(TICK);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    while running.load(Ordering::SeqCst) {
        interval.tick().await;

        if paused.load(Ordering::SeqCst) {
            continue;
        }

        for _ in 0..samples_per_tick {
            let t = sample_index as f64 / settings.sample_rate as f64;
            let value = (TAU * TONE_HZ * t).sin() * TONE_AMPLITUDE;
            let sample = (value * i16::MAX as f64) as i16;

            for _ in 0..settings.channels {
                writer
                    .write_sample(sample)
                    .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;
            }

            sample_index += 1;
        }

        // Progress ticks are lossy: a full or dropped channel never stalls capture
        let current_time = sample_index as f64 / settings.sample_rate as f64;
        let _ = tick_tx.try_send(ProgressUpdate { current_time });
    }

    writer
        .finalize()
        .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;

    Ok(())
}
