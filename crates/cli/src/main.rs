//! album-condense command-line entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use condense_core::{load_config, validate_config, Config, Dispatcher, Mode, RunSummary};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

const EXIT_OK: i32 = 0;
const EXIT_SETUP: i32 = 1;
const EXIT_JOBS_FAILED: i32 = 2;
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "album-condense")]
#[command(about = "Compress and condense album collections")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "ALBUM_CONDENSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transcode to lossy audio and images, copying already-lossy media
    Lossy(RunArgs),
    /// Transcode to lossless audio and images, rewriting cue sheets
    Lossless(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Concurrent conversion jobs (overrides the config file)
    #[arg(short = 'n', long = "worker-num")]
    worker_num: Option<usize>,

    /// Source directory
    src_path: PathBuf,

    /// Destination directory
    dst_path: PathBuf,
}

impl Command {
    fn mode(&self) -> Mode {
        match self {
            Self::Lossy(_) => Mode::Lossy,
            Self::Lossless(_) => Mode::Lossless,
        }
    }

    fn args(&self) -> &RunArgs {
        match self {
            Self::Lossy(args) | Self::Lossless(args) => args,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            EXIT_SETUP
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    info!("album-condense {}", VERSION);

    let mode = cli.command.mode();
    let args = cli.command.args();
    let config = load_settings(cli.config.as_deref(), args.worker_num)?;

    let dispatcher = Dispatcher::new(Arc::new(config), mode);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupted, stopping running jobs...");
        trigger.cancel();
    });

    let summary = dispatcher
        .run(&args.src_path, &args.dst_path, &cancel)
        .await
        .context("Failed to start run")?;

    report(&summary);
    Ok(exit_code(&summary))
}

/// Loads and validates configuration, applying the command-line worker count.
fn load_settings(path: Option<&Path>, worker_num: Option<usize>) -> Result<Config> {
    if let Some(path) = path {
        info!("Loading configuration from {:?}", path);
    }
    let mut config = load_config(path).context("Failed to load configuration")?;
    if let Some(worker_num) = worker_num {
        config.worker_num = worker_num;
    }
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn report(summary: &RunSummary) {
    for failure in &summary.failures {
        error!("failed: {}", failure);
    }
    if summary.cancelled {
        warn!("cancelled after {} of {} jobs", summary.succeeded, summary.jobs);
    } else {
        info!(
            "all done ! {} jobs ({} tracks), {} failed, {} skipped",
            summary.jobs,
            summary.track_jobs,
            summary.failures.len(),
            summary.skipped
        );
    }
}

fn exit_code(summary: &RunSummary) -> i32 {
    if summary.cancelled {
        EXIT_CANCELLED
    } else if !summary.failures.is_empty() {
        EXIT_JOBS_FAILED
    } else {
        EXIT_OK
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use condense_core::JobFailure;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_lossless_with_workers() {
        let cli = Cli::try_parse_from([
            "album-condense",
            "lossless",
            "-n",
            "2",
            "/music",
            "/out",
        ])
        .unwrap();

        assert_eq!(cli.command.mode(), Mode::Lossless);
        let args = cli.command.args();
        assert_eq!(args.worker_num, Some(2));
        assert_eq!(args.src_path, PathBuf::from("/music"));
        assert_eq!(args.dst_path, PathBuf::from("/out"));
    }

    #[test]
    fn test_parse_requires_paths() {
        assert!(Cli::try_parse_from(["album-condense", "lossy", "/music"]).is_err());
        assert!(Cli::try_parse_from(["album-condense", "/music", "/out"]).is_err());
    }

    #[test]
    fn test_worker_override_is_validated() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "worker_num = 8\naudio_codec = \"mp3\"").unwrap();

        let config = load_settings(Some(file.path()), Some(3)).unwrap();
        assert_eq!(config.worker_num, 3);

        assert!(load_settings(Some(file.path()), Some(0)).is_err());
    }

    #[test]
    fn test_missing_config_file_fails() {
        assert!(load_settings(Some(Path::new("/nonexistent/condense.toml")), None).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let mut summary = RunSummary::default();
        assert_eq!(exit_code(&summary), EXIT_OK);

        summary.failures.push(JobFailure {
            source: PathBuf::from("a.flac"),
            track: None,
            error: "ffmpeg failed".to_string(),
        });
        assert_eq!(exit_code(&summary), EXIT_JOBS_FAILED);

        summary.cancelled = true;
        assert_eq!(exit_code(&summary), EXIT_CANCELLED);
    }
}
