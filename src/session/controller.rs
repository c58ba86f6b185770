use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::events::SessionEvent;
use super::state::{Authorization, Phase, Session};
use crate::audio::{CaptureBackend, EncoderSettings, PlaybackBackend, WorkingFile};
use crate::error::{CaptureError, SessionError};

/// Capacity of the observer event channel. Observers that fall this far
/// behind lose the oldest events, never block the controller.
const EVENT_BUFFER: usize = 64;

/// Mediates between user intents (record/pause/resume/stop/play) and the
/// capture/playback backends, enforcing legal phase transitions.
///
/// Intents are `&mut self` async methods, so a second intent cannot be issued
/// while one is suspended on a backend call; the backends only support one
/// active operation at a time and this serializes access to them. Backend
/// failures never escape: each handler recovers locally, logs, and mirrors
/// the error onto the observer channel.
pub struct RecordingSessionController {
    capture: Box<dyn CaptureBackend>,
    playback: Box<dyn PlaybackBackend>,
    settings: EncoderSettings,
    session: Arc<Mutex<Session>>,
    events_tx: broadcast::Sender<SessionEvent>,
    progress_task: Option<JoinHandle<()>>,
}

impl RecordingSessionController {
    pub fn new(
        capture: Box<dyn CaptureBackend>,
        playback: Box<dyn PlaybackBackend>,
        working: WorkingFile,
        settings: EncoderSettings,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            capture,
            playback,
            settings,
            session: Arc::new(Mutex::new(Session::new(working.path))),
            events_tx,
            progress_task: None,
        }
    }

    /// Subscribe to session events. Every observer gets every event from the
    /// moment of subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Snapshot of the current session state.
    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Request microphone authorization and, if granted, arm the working
    /// file path. Denied authorization leaves the session idle and blocks
    /// every subsequent record attempt for the process lifetime.
    pub async fn initialize(&mut self) -> Authorization {
        let granted = match self.capture.request_authorization().await {
            Ok(granted) => granted,
            Err(e) => {
                error!("Authorization request failed: {}", e);
                self.report("initialize", &SessionError::Capture(e));
                false
            }
        };

        let authorized = if granted {
            Authorization::Granted
        } else {
            Authorization::Denied
        };
        self.session.lock().await.authorized = authorized;

        if authorized == Authorization::Granted {
            if let Err(e) = self.prepare_working_path().await {
                error!("Failed to prepare recording path: {}", e);
                self.report("initialize", &SessionError::Capture(e));
            }
        } else {
            info!("Microphone authorization denied; recording disabled");
        }

        authorized
    }

    /// Start a new recording.
    ///
    /// No-op with a report if already recording or not authorized. Coming
    /// from `Stopped`, the working path is re-prepared first (the previous
    /// file is overwritten and the elapsed counter resets to 0).
    pub async fn record(&mut self) {
        let from_stopped = {
            let session = self.session.lock().await;

            // Paused counts as "already recording": the capture is live and
            // resumable, not a spot to start a fresh one
            if matches!(session.phase, Phase::Recording | Phase::Paused) {
                warn!("Already recording");
                self.report(
                    "record",
                    &SessionError::InvalidTransition {
                        intent: "record",
                        phase: session.phase,
                    },
                );
                return;
            }

            if session.authorized != Authorization::Granted {
                warn!("No permission granted");
                self.report("record", &SessionError::PermissionDenied);
                return;
            }

            session.phase == Phase::Stopped
        };

        if from_stopped {
            if let Err(e) = self.prepare_working_path().await {
                error!("Failed to re-prepare recording path: {}", e);
                self.report("record", &SessionError::Capture(e));
                return;
            }
        }

        match self.capture.start().await {
            Ok(()) => {
                self.set_phase(Phase::Recording).await;
                info!("Recording started");
            }
            Err(e) => {
                error!("Failed to start recording: {}", e);
                self.report("record", &SessionError::Capture(e));
            }
        }
    }

    /// Pause an in-progress recording. No-op unless recording.
    pub async fn pause(&mut self) {
        {
            let session = self.session.lock().await;
            if session.phase != Phase::Recording {
                warn!("Not recording");
                self.report(
                    "pause",
                    &SessionError::InvalidTransition {
                        intent: "pause",
                        phase: session.phase,
                    },
                );
                return;
            }
        }

        match self.capture.pause().await {
            Ok(()) => {
                self.set_phase(Phase::Paused).await;
                info!("Recording paused");
            }
            Err(e) => {
                error!("Failed to pause recording: {}", e);
                self.report("pause", &SessionError::Capture(e));
            }
        }
    }

    /// Resume a paused recording. No-op unless paused.
    pub async fn resume(&mut self) {
        {
            let session = self.session.lock().await;
            if session.phase != Phase::Paused {
                warn!("Not paused");
                self.report(
                    "resume",
                    &SessionError::InvalidTransition {
                        intent: "resume",
                        phase: session.phase,
                    },
                );
                return;
            }
        }

        match self.capture.resume().await {
            Ok(()) => {
                self.set_phase(Phase::Recording).await;
                info!("Recording resumed");
            }
            Err(e) => {
                error!("Failed to resume recording: {}", e);
                self.report("resume", &SessionError::Capture(e));
            }
        }
    }

    /// Stop the recording and finalize the working file.
    ///
    /// The phase flips to `Stopped` before the backend call and is never
    /// rolled back on failure. Intentional: the transport controls stay
    /// responsive even when the backend misbehaves, at the cost of a phase
    /// that may claim a recording the backend failed to finalize.
    pub async fn stop(&mut self) {
        {
            let session = self.session.lock().await;
            if !matches!(session.phase, Phase::Recording | Phase::Paused) {
                warn!("Not recording");
                self.report(
                    "stop",
                    &SessionError::InvalidTransition {
                        intent: "stop",
                        phase: session.phase,
                    },
                );
                return;
            }
        }

        self.set_phase(Phase::Stopped).await;

        match self.capture.stop().await {
            Ok(outcome) => {
                let mut session = self.session.lock().await;
                info!(
                    "Finished recording of duration {}s at path: {} and size of {} bytes",
                    session.elapsed_seconds,
                    outcome.path.display(),
                    outcome.size_bytes
                );
                session.last_recording_outcome = Some(outcome.clone());
                drop(session);
                let _ = self.events_tx.send(SessionEvent::RecordingFinished(outcome));
            }
            Err(e) => {
                error!("Failed to stop recording: {}", e);
                self.report("stop", &SessionError::Capture(e));
            }
        }
    }

    /// Play back the working file. If a recording is in progress it is fully
    /// stopped first. Playback never alters the phase.
    pub async fn play(&mut self) {
        if self.session.lock().await.phase == Phase::Recording {
            self.stop().await;
        }

        let path = self.session.lock().await.working_path.clone();

        let handle = match self.playback.load(&path).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to load the sound: {}", e);
                self.report("play", &SessionError::Playback(e));
                return;
            }
        };

        match self.playback.play(handle).await {
            Ok(()) => {
                info!("Successfully finished playing");
                let _ = self
                    .events_tx
                    .send(SessionEvent::PlaybackFinished { succeeded: true });
            }
            Err(e) => {
                error!("Playback failed: {}", e);
                let _ = self
                    .events_tx
                    .send(SessionEvent::PlaybackFinished { succeeded: false });
                self.report("play", &SessionError::Playback(e));
            }
        }
    }

    /// Arm the capture backend on the working path and restart the progress
    /// pump. Callers ensure the session is in `Idle` or `Stopped`.
    async fn prepare_working_path(&mut self) -> Result<(), CaptureError> {
        let path = self.session.lock().await.working_path.clone();

        let mut progress_rx = self.capture.prepare(&path, &self.settings).await?;

        // A fresh prepare replaces the previous tick stream
        if let Some(task) = self.progress_task.take() {
            task.abort();
        }

        {
            let mut session = self.session.lock().await;
            session.elapsed_seconds = 0;
        }

        let session = Arc::clone(&self.session);
        let events_tx = self.events_tx.clone();

        self.progress_task = Some(tokio::spawn(async move {
            while let Some(update) = progress_rx.recv().await {
                let mut session = session.lock().await;

                // Elapsed time only advances while recording; a tick racing a
                // pause lands after the phase change and is dropped here
                if session.phase != Phase::Recording {
                    continue;
                }

                let seconds = update.current_time.floor() as u64;
                if seconds > session.elapsed_seconds {
                    session.elapsed_seconds = seconds;
                    let _ = events_tx.send(SessionEvent::Progress {
                        elapsed_seconds: seconds,
                    });
                }
            }
        }));

        info!("Working path armed: {}", path.display());

        Ok(())
    }

    async fn set_phase(&self, phase: Phase) {
        self.session.lock().await.phase = phase;
        let _ = self.events_tx.send(SessionEvent::PhaseChanged(phase));
    }

    fn report(&self, intent: &'static str, err: &SessionError) {
        let _ = self.events_tx.send(SessionEvent::Error {
            intent,
            message: err.to_string(),
        });
    }
}

impl Drop for RecordingSessionController {
    fn drop(&mut self) {
        if let Some(task) = self.progress_task.take() {
            task.abort();
        }
    }
}
