//! kokoro-speak - synthesize text to a sound file with Kokoro.

use std::process::ExitCode;

use anyhow::Result;
use serde::Serialize;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use kokoro_speak::audio::{Player, read_wav};
use kokoro_speak::config::AppConfig;
use kokoro_speak::paths::{self, ArtifactPaths};
use kokoro_speak::{ErrorKind, SpeechOutput, generate_speech};

/// Exit code after Ctrl+C or SIGTERM.
const EXIT_INTERRUPTED: i32 = 130;

/// Machine-readable result for `--json`.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Report {
    Ok(SpeechOutput),
    Error { kind: Option<ErrorKind>, message: String },
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("🛑 Received Ctrl+C, stopping...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("🛑 Received SIGTERM, stopping...");
        }
    }
}

/// Run `work` on the blocking pool, exiting with code 130 if a shutdown signal arrives first.
async fn run_blocking<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> Result<T> {
    let handle = tokio::task::spawn_blocking(work);

    tokio::select! {
        result = handle => Ok(result?),
        _ = wait_for_shutdown() => std::process::exit(EXIT_INTERRUPTED),
    }
}

/// Play a written sound file on the default output device.
fn play_file(output: &SpeechOutput) -> Result<()> {
    let audio = read_wav(&output.path)?;
    let player = Player::new()?;

    info!("🔊 Playing {:.2}s of audio", audio.duration_secs());
    if !player.play(&audio.samples, audio.sample_rate) {
        warn!("Playback did not complete");
    }
    Ok(())
}

fn print_json(report: &Report) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize result: {}", e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if config.verbose { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("🗣️  kokoro-speak v{}", env!("CARGO_PKG_VERSION"));

    let text = match config.input_text() {
        Ok(text) => text,
        Err(e) => {
            error!("❌ {:#}", e);
            if config.json {
                print_json(&Report::Error { kind: None, message: format!("{:#}", e) });
            }
            return ExitCode::FAILURE;
        }
    };

    config.log_config();

    let base_dir = config.artifact_dir.clone().unwrap_or_else(paths::default_base_dir);
    let artifacts = match ArtifactPaths::resolve(&base_dir, &config.model_file, &config.voices_file) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            error!("❌ {}", e);
            if config.json {
                print_json(&Report::Error { kind: Some(e.kind()), message: e.to_string() });
            }
            return ExitCode::FAILURE;
        }
    };

    let speech = config.speech_config();
    let output_path = config.output.clone();
    let result = match run_blocking(move || generate_speech(&text, &output_path, &speech, &artifacts)).await {
        Ok(result) => result,
        Err(e) => {
            error!("❌ Generation task failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if config.json {
                print_json(&Report::Error { kind: Some(e.kind()), message: e.to_string() });
            } else if e.kind() == ErrorKind::MissingArtifact {
                error!("Point --artifact-dir (or KOKORO_DIR) at the directory holding models/ and voices/.");
            }
            return ExitCode::FAILURE;
        }
    };

    info!("✅ Wrote {} ({} samples at {} Hz, {:.2}s)", output.path.display(), output.num_samples, output.sample_rate, output.duration_secs);

    if config.play {
        let to_play = output.clone();
        match run_blocking(move || play_file(&to_play)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) | Err(e) => warn!("Playback failed: {:#}", e),
        }
    }

    if config.json {
        print_json(&Report::Ok(output));
    }

    ExitCode::SUCCESS
}
