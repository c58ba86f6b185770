// State machine tests for RecordingSessionController.
//
// Backends are scripted in-memory fakes that log every call, so each test can
// assert both the resulting phase and exactly which backend calls were made.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use micnote::{
    Authorization, CaptureBackend, CaptureError, EncoderSettings, Phase, PlaybackBackend,
    PlaybackError, PlaybackHandle, ProgressUpdate, RecordingOutcome, RecordingSessionController,
    SessionEvent, WorkingFile,
};
use tokio::sync::mpsc;

type Calls = Arc<Mutex<Vec<String>>>;

struct ScriptedCapture {
    calls: Calls,
    authorize: bool,
    fail_start: bool,
    fail_pause: bool,
    fail_stop: bool,
    progress_tx: Arc<Mutex<Option<mpsc::Sender<ProgressUpdate>>>>,
}

impl ScriptedCapture {
    fn new(calls: Calls) -> Self {
        Self {
            calls,
            authorize: true,
            fail_start: false,
            fail_pause: false,
            fail_stop: false,
            progress_tx: Arc::new(Mutex::new(None)),
        }
    }

    fn progress_slot(&self) -> Arc<Mutex<Option<mpsc::Sender<ProgressUpdate>>>> {
        Arc::clone(&self.progress_tx)
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ScriptedCapture {
    async fn request_authorization(&mut self) -> Result<bool, CaptureError> {
        self.log("request_authorization");
        Ok(self.authorize)
    }

    async fn prepare(
        &mut self,
        path: &Path,
        _settings: &EncoderSettings,
    ) -> Result<mpsc::Receiver<ProgressUpdate>, CaptureError> {
        self.log(format!("prepare:{}", path.display()));
        let (tx, rx) = mpsc::channel(32);
        *self.progress_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn start(&mut self) -> Result<(), CaptureError> {
        self.log("start");
        if self.fail_start {
            return Err(CaptureError::Backend("scripted start failure".to_string()));
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), CaptureError> {
        self.log("pause");
        if self.fail_pause {
            return Err(CaptureError::Backend("scripted pause failure".to_string()));
        }
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), CaptureError> {
        self.log("resume");
        Ok(())
    }

    async fn stop(&mut self) -> Result<RecordingOutcome, CaptureError> {
        self.log("stop");
        if self.fail_stop {
            return Err(CaptureError::Backend("scripted stop failure".to_string()));
        }
        Ok(RecordingOutcome {
            succeeded: true,
            path: PathBuf::from("/tmp/memo-test.wav"),
            size_bytes: 2048,
            finished_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedPlayback {
    calls: Calls,
    fail_load: bool,
}

impl ScriptedPlayback {
    fn new(calls: Calls) -> Self {
        Self {
            calls,
            fail_load: false,
        }
    }
}

#[async_trait::async_trait]
impl PlaybackBackend for ScriptedPlayback {
    async fn load(&mut self, path: &Path) -> Result<PlaybackHandle, PlaybackError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("load:{}", path.display()));
        if self.fail_load {
            return Err(PlaybackError::Load {
                path: path.to_path_buf(),
                reason: "scripted load failure".to_string(),
            });
        }
        Ok(PlaybackHandle {
            path: path.to_path_buf(),
            duration_secs: Some(1.0),
            sample_rate: 22050,
            channels: 1,
        })
    }

    async fn play(&mut self, _handle: PlaybackHandle) -> Result<(), PlaybackError> {
        self.calls.lock().unwrap().push("play".to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn controller_with(
    capture: ScriptedCapture,
    playback: ScriptedPlayback,
) -> RecordingSessionController {
    RecordingSessionController::new(
        Box::new(capture),
        Box::new(playback),
        WorkingFile {
            path: PathBuf::from("/tmp/memo-test.wav"),
        },
        EncoderSettings::default(),
    )
}

async fn send_tick(slot: &Arc<Mutex<Option<mpsc::Sender<ProgressUpdate>>>>, current_time: f64) {
    let tx = slot.lock().unwrap().clone().expect("no progress channel");
    tx.send(ProgressUpdate { current_time }).await.unwrap();
    // Give the progress pump a chance to run
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn full_record_pause_resume_stop_scenario() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let ticks = capture.progress_slot();
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    let authorized = controller.initialize().await;
    assert_eq!(authorized, Authorization::Granted);
    assert_eq!(controller.session().await.phase, Phase::Idle);

    controller.record().await;
    assert_eq!(controller.session().await.phase, Phase::Recording);

    send_tick(&ticks, 0.4).await;
    send_tick(&ticks, 1.2).await;
    send_tick(&ticks, 2.6).await;
    assert_eq!(controller.session().await.elapsed_seconds, 2);

    controller.pause().await;
    assert_eq!(controller.session().await.phase, Phase::Paused);

    // Ticks arriving while paused must not move the counter
    send_tick(&ticks, 9.9).await;
    assert_eq!(controller.session().await.elapsed_seconds, 2);

    controller.resume().await;
    assert_eq!(controller.session().await.phase, Phase::Recording);

    controller.stop().await;
    let session = controller.session().await;
    assert_eq!(session.phase, Phase::Stopped);

    let outcome = session.last_recording_outcome.expect("no outcome recorded");
    assert!(outcome.succeeded);
    assert_eq!(outcome.size_bytes, 2048);

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            "request_authorization",
            "prepare:/tmp/memo-test.wav",
            "start",
            "pause",
            "resume",
            "stop",
        ]
    );
}

#[tokio::test]
async fn record_without_permission_is_a_no_op() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let mut capture = ScriptedCapture::new(Arc::clone(&calls));
    capture.authorize = false;
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    let authorized = controller.initialize().await;
    assert_eq!(authorized, Authorization::Denied);

    controller.record().await;

    let session = controller.session().await;
    assert_eq!(session.phase, Phase::Idle);
    assert_eq!(session.authorized, Authorization::Denied);

    // Denied authorization means no prepare and no start, ever
    assert_eq!(*calls.lock().unwrap(), vec!["request_authorization"]);
}

#[tokio::test]
async fn record_while_recording_is_a_no_op() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.record().await;
    controller.record().await;

    assert_eq!(controller.session().await.phase, Phase::Recording);
    let starts = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| *c == "start")
        .count();
    assert_eq!(starts, 1);
}

#[tokio::test]
async fn record_while_paused_is_a_no_op() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.record().await;
    controller.pause().await;
    controller.record().await;

    // A paused capture is still the active recording
    assert_eq!(controller.session().await.phase, Phase::Paused);
    let starts = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| *c == "start")
        .count();
    assert_eq!(starts, 1);
}

#[tokio::test]
async fn pause_is_a_no_op_unless_recording() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.pause().await;

    assert_eq!(controller.session().await.phase, Phase::Idle);
    assert!(!calls.lock().unwrap().contains(&"pause".to_string()));
}

#[tokio::test]
async fn resume_is_a_no_op_unless_paused() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.record().await;
    controller.resume().await;

    assert_eq!(controller.session().await.phase, Phase::Recording);
    assert!(!calls.lock().unwrap().contains(&"resume".to_string()));
}

#[tokio::test]
async fn stop_is_a_no_op_unless_recording_or_paused() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.stop().await;

    assert_eq!(controller.session().await.phase, Phase::Idle);
    assert!(!calls.lock().unwrap().contains(&"stop".to_string()));
}

#[tokio::test]
async fn stop_is_optimistic_on_backend_failure() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let mut capture = ScriptedCapture::new(Arc::clone(&calls));
    capture.fail_stop = true;
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.record().await;
    controller.stop().await;

    // The phase flips before the backend call and is never rolled back,
    // so a failed stop still reads Stopped
    let session = controller.session().await;
    assert_eq!(session.phase, Phase::Stopped);
    assert!(session.last_recording_outcome.is_none());
}

#[tokio::test]
async fn start_failure_leaves_phase_unchanged() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let mut capture = ScriptedCapture::new(Arc::clone(&calls));
    capture.fail_start = true;
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.record().await;

    assert_eq!(controller.session().await.phase, Phase::Idle);
}

#[tokio::test]
async fn pause_failure_leaves_phase_recording() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let mut capture = ScriptedCapture::new(Arc::clone(&calls));
    capture.fail_pause = true;
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.record().await;
    controller.pause().await;

    assert_eq!(controller.session().await.phase, Phase::Recording);
}

#[tokio::test]
async fn play_while_recording_stops_first() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.record().await;
    controller.play().await;

    // Playback never alters the phase; the implicit stop left it Stopped
    assert_eq!(controller.session().await.phase, Phase::Stopped);

    let calls = calls.lock().unwrap();
    let stop_at = calls.iter().position(|c| c == "stop").expect("no stop");
    let load_at = calls
        .iter()
        .position(|c| c.starts_with("load:"))
        .expect("no load");
    assert!(stop_at < load_at, "stop must complete before load");
    assert_eq!(calls[load_at], "load:/tmp/memo-test.wav");
    assert_eq!(calls[load_at + 1], "play");
}

#[tokio::test]
async fn play_while_idle_does_not_stop() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.record().await;
    controller.stop().await;

    // Previously stopped recording present; play straight from Stopped/Idle
    controller.play().await;

    let calls = calls.lock().unwrap();
    let stops = calls.iter().filter(|c| *c == "stop").count();
    assert_eq!(stops, 1, "play must not issue a second stop");
    assert!(calls.contains(&"load:/tmp/memo-test.wav".to_string()));
    assert!(calls.contains(&"play".to_string()));
}

#[tokio::test]
async fn load_failure_aborts_playback() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let mut playback = ScriptedPlayback::new(Arc::clone(&calls));
    playback.fail_load = true;
    let mut controller = controller_with(capture, playback);

    controller.initialize().await;
    controller.record().await;
    controller.stop().await;
    controller.play().await;

    let calls = calls.lock().unwrap();
    assert!(!calls.contains(&"play".to_string()), "play after failed load");
}

#[tokio::test]
async fn record_from_stopped_re_prepares_and_resets_elapsed() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let ticks = capture.progress_slot();
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));

    controller.initialize().await;
    controller.record().await;
    send_tick(&ticks, 3.0).await;
    assert_eq!(controller.session().await.elapsed_seconds, 3);

    controller.stop().await;
    controller.record().await;

    let session = controller.session().await;
    assert_eq!(session.phase, Phase::Recording);
    assert_eq!(session.elapsed_seconds, 0, "re-prepare must reset elapsed");

    let prepares = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with("prepare:"))
        .count();
    assert_eq!(prepares, 2);
}

#[tokio::test]
async fn observer_sees_phase_changes_and_rejections() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let capture = ScriptedCapture::new(Arc::clone(&calls));
    let mut controller = controller_with(capture, ScriptedPlayback::new(Arc::clone(&calls)));
    let mut events = controller.subscribe();

    controller.initialize().await;
    controller.pause().await; // rejected: not recording
    controller.record().await;
    controller.stop().await;

    let mut saw_rejection = false;
    let mut phases = Vec::new();
    let mut finished = false;

    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::PhaseChanged(phase) => phases.push(phase),
            SessionEvent::Error { intent, .. } => {
                if intent == "pause" {
                    saw_rejection = true;
                }
            }
            SessionEvent::RecordingFinished(outcome) => finished = outcome.succeeded,
            _ => {}
        }
    }

    assert!(saw_rejection, "rejected pause not reported");
    assert_eq!(phases, vec![Phase::Recording, Phase::Stopped]);
    assert!(finished, "recording outcome not reported");
}
