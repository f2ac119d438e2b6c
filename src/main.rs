// mostplayed - "my most played artists" playlist from streaming history
// Top artists by listening time first, each artist's top tracks inside, same order in the CSV

use anyhow::{Context, Result};
use clap::Parser;
use mostplayed::{
    config::Config,
    export, history,
    selection::{self, FilterMode, Selection},
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "mostplayed")]
#[command(about = "Build a playlist of your most played artists and their most played tracks")]
struct Args {
    /// Config file (default: <config dir>/mostplayed/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the playlist to create (an existing one is never reused)
    #[arg(long)]
    playlist_name: Option<String>,

    /// First year to include, e.g. 2023
    #[arg(long)]
    year_start: Option<i32>,

    /// Last year to include, e.g. 2025
    #[arg(long)]
    year_end: Option<i32>,

    /// How many top artists to take
    #[arg(long)]
    top_artists: Option<usize>,

    /// How many top tracks to take from each artist
    #[arg(long)]
    tracks_per_artist: Option<usize>,

    /// Shortest single play that counts (ms)
    #[arg(long)]
    min_play_ms: Option<u64>,

    /// Keep only tracks whose total listening time is above this (ms)
    #[arg(long)]
    min_track_total_ms: Option<u64>,

    /// Text file of artist patterns: one substring per line, blank lines and '#' ignored
    #[arg(long)]
    artists_filter_file: Option<PathBuf>,

    /// exclude = drop matching artists, include = keep only matching artists
    #[arg(long)]
    artists_filter_mode: Option<FilterMode>,

    /// Directory holding the streaming history JSON files
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Where the CSV goes
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write the CSV but don't publish a playlist
    #[arg(long)]
    dry_run: bool,

    /// Also log to a daily rotating file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        let selection = &mut config.selection;

        if let Some(v) = self.top_artists {
            selection.top_artists = v;
        }
        if let Some(v) = self.tracks_per_artist {
            selection.tracks_per_artist = v;
        }
        if let Some(v) = self.min_play_ms {
            selection.min_play_ms = v;
        }
        if self.min_track_total_ms.is_some() {
            selection.min_track_total_ms = self.min_track_total_ms;
        }
        if self.year_start.is_some() {
            selection.year_start = self.year_start;
        }
        if self.year_end.is_some() {
            selection.year_end = self.year_end;
        }
        if self.artists_filter_file.is_some() {
            selection.artists_filter_file = self.artists_filter_file.clone();
        }
        if let Some(mode) = self.artists_filter_mode {
            selection.artists_filter_mode = mode;
        }
        if let Some(dir) = &self.source_dir {
            config.source_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(name) = &self.playlist_name {
            config.spotify.playlist_name = name.clone();
        }
    }
}

fn init_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mostplayed=info"));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // Daily rotating file appender, only when asked for
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "mostplayed.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(base_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

fn main() -> ExitCode {
    // SPOTIFY_* credentials may live in .env
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Guard must live until exit or buffered file logs are lost
    let _guard = match init_logging(args.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("[ERROR] Failed to start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let code = runtime.block_on(run_or_interrupt(
        run(args, Arc::clone(&cancel)),
        tokio::signal::ctrl_c(),
        &cancel,
    ));

    // A selection still running on the blocking pool is abandoned, not joined
    runtime.shutdown_background();
    ExitCode::from(code)
}

/// Drive `work` to completion unless `interrupt` fires first.
///
/// On interrupt the cancel flag is raised and 130 comes back right away.
/// If the interrupt listener itself fails, `work` just runs to the end.
async fn run_or_interrupt<F, S>(work: F, interrupt: S, cancel: &AtomicBool) -> u8
where
    F: Future<Output = Result<()>>,
    S: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(work);

    tokio::select! {
        result = &mut work => exit_code(result),
        signal = interrupt => match signal {
            Ok(()) => {
                cancel.store(true, Ordering::SeqCst);
                eprintln!("\n[ABORTED] Interrupted by user");
                130
            }
            Err(e) => {
                warn!("Can't listen for Ctrl-C, running to completion: {}", e);
                exit_code(work.await)
            }
        },
    }
}

fn exit_code(result: Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            1
        }
    }
}

async fn run(args: Args, cancel: Arc<AtomicBool>) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply(&mut config);

    // Bad settings fail here, before any history is read
    let params = config.selection.to_params()?;

    let description = format!(
        "Generated by mostplayed | Command: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    info!("mostplayed starting");

    let (selection, csv_path) = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || build_selection(&config, &params, &cancel))
            .await
            .context("Selection task failed")??
    };

    let url = if args.dry_run {
        info!("Dry run: skipping playlist publishing");
        None
    } else {
        publish(&config, &description, &selection.track_uris).await?
    };

    info!("Done: {} ({} tracks)", config.spotify.playlist_name, selection.track_uris.len());
    if let Some(url) = url {
        info!("URL: {}", url);
    }
    info!("CSV: {}", csv_path.display());

    Ok(())
}

/// Load, select and write the CSV. Stops before writing once `cancel` is set.
fn build_selection(
    config: &Config,
    params: &selection::SelectionParams,
    cancel: &AtomicBool,
) -> Result<(Selection, PathBuf)> {
    let events = history::load_history(&config.source_dir)?;
    let selection = selection::select(&events, params)?;

    if cancel.load(Ordering::SeqCst) {
        anyhow::bail!("Interrupted before writing the CSV");
    }

    let csv_path = export::write_csv(
        &selection.rows,
        &config.spotify.playlist_name,
        &config.output_dir,
    )?;
    Ok((selection, csv_path))
}

#[cfg(feature = "spotify")]
async fn publish(config: &Config, description: &str, uris: &[String]) -> Result<Option<String>> {
    use mostplayed::spotify::{Credentials, SpotifyClient};

    info!("Authenticating with Spotify");
    let client = SpotifyClient::connect(Credentials::from_env()?).await?;
    client
        .publish_playlist(
            &config.spotify.playlist_name,
            description,
            uris,
            config.spotify.public,
        )
        .await
}

#[cfg(not(feature = "spotify"))]
async fn publish(_config: &Config, _description: &str, _uris: &[String]) -> Result<Option<String>> {
    warn!("Built without the `spotify` feature; skipping playlist publishing");
    Ok(None)
}
