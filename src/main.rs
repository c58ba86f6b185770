use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use micnote::{
    DecodePlayback, RecorderConfig, RecordingSessionController, SessionEvent, ToneCapture,
    WorkingFile,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "micnote", about = "Single-file audio memo recorder")]
struct Cli {
    /// Config file (optional; defaults apply when missing)
    #[arg(long, default_value = "config/micnote")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record for a fixed number of seconds, then stop
    Record {
        #[arg(long, default_value_t = 3)]
        seconds: u64,
    },
    /// Play back an existing recording
    Play { file: PathBuf },
    /// Record with a pause/resume in the middle, then play the result back
    Demo {
        #[arg(long, default_value_t = 2)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = RecorderConfig::load(&cli.config)?;

    info!("micnote v0.1.0");

    match cli.command {
        Command::Record { seconds } => {
            let mut controller = build_controller(&cfg, None);
            watch_events(&controller);

            controller.initialize().await;
            controller.record().await;
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            controller.stop().await;

            print_outcome(&controller).await?;
        }

        Command::Play { file } => {
            let mut controller = build_controller(&cfg, Some(file));
            watch_events(&controller);

            // No recording needed; play() loads whatever is at the working path
            controller.play().await;
        }

        Command::Demo { seconds } => {
            let mut controller = build_controller(&cfg, None);
            watch_events(&controller);

            controller.initialize().await;

            controller.record().await;
            tokio::time::sleep(Duration::from_secs(seconds)).await;

            controller.pause().await;
            tokio::time::sleep(Duration::from_millis(500)).await;
            controller.resume().await;
            tokio::time::sleep(Duration::from_secs(seconds)).await;

            controller.stop().await;
            print_outcome(&controller).await?;

            controller.play().await;
        }
    }

    Ok(())
}

fn build_controller(
    cfg: &RecorderConfig,
    path_override: Option<PathBuf>,
) -> RecordingSessionController {
    let working = match path_override {
        Some(path) => WorkingFile { path },
        None => WorkingFile::in_dir(&cfg.output_dir, &cfg.file_stem, cfg.encoder.encoding),
    };

    info!("Working file: {}", working.path.display());

    RecordingSessionController::new(
        Box::new(ToneCapture::new()),
        Box::new(DecodePlayback::new()),
        working,
        cfg.encoder.clone(),
    )
}

/// Mirror session events to the log the way the app screen would render them.
fn watch_events(controller: &RecordingSessionController) {
    let mut events = controller.subscribe();

    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::Progress { elapsed_seconds } => {
                    info!("{}s", elapsed_seconds);
                }
                SessionEvent::PhaseChanged(phase) => {
                    info!("Phase: {:?}", phase);
                }
                SessionEvent::RecordingFinished(outcome) => {
                    info!(
                        "Recording finished: {} ({} bytes)",
                        outcome.path.display(),
                        outcome.size_bytes
                    );
                }
                SessionEvent::PlaybackFinished { succeeded } => {
                    info!("Playback finished (succeeded: {})", succeeded);
                }
                SessionEvent::Error { intent, message } => {
                    info!("{} rejected: {}", intent, message);
                }
            }
        }
    });
}

async fn print_outcome(controller: &RecordingSessionController) -> Result<()> {
    let session = controller.session().await;
    if let Some(outcome) = &session.last_recording_outcome {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    }
    Ok(())
}
