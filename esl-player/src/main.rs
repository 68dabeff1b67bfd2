//! ESL Segment Player (esl-player) - command line entry point
//!
//! Inspect transcript timing, export subtitles, or drive the segment
//! controller against a simulated player and print what it publishes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use esl_common::config::{resolve_config_path, TomlConfig};
use esl_common::subtitles::{self, SubtitleFormat};
use esl_common::time::format_clock;
use esl_common::{PlaybackMode, Transcript};
use esl_player::playback::SegmentTimeline;
use esl_player::{ControllerConfig, SegmentController, SimulatedPlayer};
use futures::StreamExt;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Simulated player clock tick
const SIMULATED_TICK: Duration = Duration::from_millis(250);

/// Extra media after the last segment in simulation
const SIMULATED_TAIL_SECS: f64 = 2.0;

/// Command-line arguments for esl-player
#[derive(Parser, Debug)]
#[command(name = "esl-player")]
#[command(about = "Segment-synchronized playback for ESL listening practice")]
#[command(version)]
struct Args {
    /// Config file (overrides ESL_PLAYER_CONFIG and the platform default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print raw and computed playback windows of each segment
    Inspect {
        /// WhisperX-style transcript JSON
        transcript: PathBuf,
    },

    /// Render subtitles
    Export {
        /// WhisperX-style transcript JSON
        transcript: PathBuf,

        /// Subtitle format (vtt or srt)
        #[arg(short, long, default_value = "vtt")]
        format: SubtitleFormat,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Drive the controller with a simulated player and print its events
    Simulate {
        /// WhisperX-style transcript JSON
        transcript: PathBuf,

        /// Playback mode (normal, listen, repeat, shadowing)
        #[arg(short, long, default_value = "listen")]
        mode: PlaybackMode,

        /// Segment to start from
        #[arg(short, long, default_value_t = 0)]
        segment: usize,

        /// Playback rate
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 120)]
        timeout_secs: u64,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the default log level
    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config =
        TomlConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("esl_player={level},esl_common={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    let config = ControllerConfig::from_settings(&toml_config.playback)
        .context("Invalid playback configuration")?;

    match args.command {
        Command::Inspect { transcript } => inspect(&transcript, &config).await,
        Command::Export {
            transcript,
            format,
            output,
        } => export(&transcript, format, output.as_deref()).await,
        Command::Simulate {
            transcript,
            mode,
            segment,
            speed,
            timeout_secs,
        } => {
            simulate(
                &transcript,
                config,
                mode,
                segment,
                speed,
                Duration::from_secs(timeout_secs),
            )
            .await
        }
        Command::Config => {
            let text = toml::to_string_pretty(&toml_config)
                .context("Failed to serialize configuration")?;
            println!("{}", text);
            Ok(())
        }
    }
}

async fn load_transcript(path: &Path) -> Result<Transcript> {
    Transcript::load(path)
        .await
        .with_context(|| format!("Failed to load transcript {}", path.display()))
}

async fn inspect(path: &Path, config: &ControllerConfig) -> Result<()> {
    let transcript = load_transcript(path).await?;
    let timeline = SegmentTimeline::new(transcript.segments, &config.timing);

    println!(
        "{:>4}  {:>17}  {:>17}  {:>5}  text",
        "#", "raw", "computed", "words"
    );
    for (index, segment) in timeline.segments().iter().enumerate() {
        let Some(window) = timeline.window(index) else {
            continue;
        };
        println!(
            "{:>4}  {:>7.2} - {:>7.2}  {:>7.2} - {:>7.2}  {:>5}  {}",
            index,
            segment.start,
            segment.end,
            window.start,
            window.end,
            segment.timed_words().count(),
            segment.text
        );
    }
    Ok(())
}

async fn export(path: &Path, format: SubtitleFormat, output: Option<&Path>) -> Result<()> {
    let transcript = load_transcript(path).await?;
    match output {
        Some(output) => subtitles::write_file(&transcript.segments, format, output)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?,
        None => print!("{}", subtitles::render(&transcript.segments, format)),
    }
    Ok(())
}

async fn simulate(
    path: &Path,
    config: ControllerConfig,
    mode: PlaybackMode,
    segment: usize,
    speed: f64,
    timeout: Duration,
) -> Result<()> {
    let transcript = load_transcript(path).await?;
    let Some(last) = transcript.segments.last() else {
        bail!("Transcript {} has no segments", path.display());
    };
    if segment >= transcript.len() {
        bail!(
            "Segment {} out of range (transcript has {})",
            segment,
            transcript.len()
        );
    }
    let duration = last.end + SIMULATED_TAIL_SECS;

    // Settled = paused with no event for longer than any controller wait
    let idle = config.listen_advance_delay.max(config.shadowing_delay_max)
        + config.debounce
        + Duration::from_secs(1);

    let controller = SegmentController::new(transcript.segments, config);
    let player = SimulatedPlayer::new(duration);
    let clock = player.spawn_clock(SIMULATED_TICK);
    let events = controller.event_stream();
    futures::pin_mut!(events);

    controller.attach_player(player.clone()).await;
    controller.set_playback_rate(speed).await;
    info!(
        "Simulating {} mode from segment {} over {} of media",
        mode,
        segment,
        format_clock(duration)
    );

    controller.go_to_segment(segment, false, false).await;
    controller.set_mode(mode).await;
    if matches!(mode, PlaybackMode::Normal | PlaybackMode::Repeat) {
        controller.toggle_play_pause().await;
    }

    let deadline = tokio::time::sleep(timeout);
    let shutdown = shutdown_signal();
    tokio::pin!(deadline, shutdown);

    loop {
        tokio::select! {
            next = tokio::time::timeout(idle, events.next()) => match next {
                Ok(Some(event)) => {
                    let line = serde_json::to_string(&event).context("Failed to serialize event")?;
                    println!("{}", line);
                }
                Ok(None) => break,
                Err(_) => {
                    if !controller.is_playing().await {
                        info!("Playback settled");
                        break;
                    }
                }
            },
            _ = &mut deadline => {
                warn!("Simulation timed out after {:?}", timeout);
                break;
            }
            _ = &mut shutdown => break,
        }
    }

    let snapshot = controller.snapshot();
    info!(
        "Final state: segment {:?}, mode {}, playing {}",
        snapshot.current_segment, snapshot.mode, snapshot.is_playing
    );

    controller.shutdown().await;
    clock.abort();
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        },
        _ = terminate => {
            info!("Received terminate signal, stopping");
        },
    }
}
