// segue - gapless terminal playlist player
// Give it one file, a list of files or a directory and it plays them back-to-back

use anyhow::Result;
use clap::Parser;
use segue::audio::playlist::path_from_input;
use segue::audio::{AudioConfig, Playlist, RodioDevice, TagReader};
use segue::config::Config;
use segue::playback::{PlaybackEngine, Session, SessionOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "segue")]
#[command(about = "Play audio files back-to-back with a live progress bar")]
struct Args {
    /// Tracks (or directories of tracks) to play in order. Reads one path
    /// from stdin when none are given.
    paths: Vec<PathBuf>,

    /// Do not draw the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn init_logging(log_dir: &Path, default_filter: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    // Daily rotating file appender, never stdout: the progress line lives there
    let file_appender = tracing_appender::rolling::daily(log_dir, "segue.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

/// Single-track mode without an argument: ask for the path
fn read_path_from_stdin() -> Result<Option<PathBuf>> {
    print!("Enter path to audio file: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(path_from_input(&line))
}

/// Resolves on ctrl-c. If the handler cannot be installed, never resolves.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load config - falls back to defaults if missing
    let mut config = Config::load()?;
    if args.no_progress {
        config.ui.show_progress = false;
    }

    let _log_guard = init_logging(&config.logging.directory, &config.logging.filter)?;
    info!("segue starting up");

    let paths = if args.paths.is_empty() {
        match read_path_from_stdin()? {
            Some(path) => vec![path],
            None => {
                eprintln!("No file given.");
                return Ok(ExitCode::FAILURE);
            }
        }
    } else {
        args.paths
    };

    let playlist = Playlist::from_args(&paths);
    info!("Playlist has {} tracks", playlist.len());

    let device = match RodioDevice::new(AudioConfig::from(&config)) {
        Ok(device) => device,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let engine = PlaybackEngine::new(playlist, TagReader::new(), config.playback.missing_track);
    let mut session = Session::new(
        device,
        engine,
        SessionOptions::from(&config),
        io::stdout(),
    );

    match session.run(interrupted()).await {
        Ok(summary) => {
            info!(
                "Session finished: {} started, {} missing",
                summary.tracks_started, summary.tracks_missing
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if !e.is_fatal() => {
            info!("Session interrupted");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Session ended with error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
