//! # yt_shorts_feed
//!
//! Builds the JSON snapshots a static site reads for its YouTube section:
//! the most recent short of each configured channel, and a categorized
//! directory of those channels with titles, avatars, and subscriber counts.
//!
//! ## Features
//!
//! - Lists recent uploads through yt-dlp or the YouTube Data API v3
//! - Picks the newest upload at or under 60 seconds per channel
//! - Formats view counts with Korean units (`2.8만회`) and publish times as
//!   relative Korean text (`3일 전`) against UTC+9
//! - Resolves channel URLs, handles, and legacy names to channel ids
//! - Replaces output files atomically so a failed run keeps the old snapshot
//!
//! ## Usage
//!
//! ```sh
//! yt_shorts_feed shorts --sources scripts/sources.txt --output docs/shorts.json
//! YOUTUBE_API_KEY=... yt_shorts_feed channels
//! ```
//!
//! ## Architecture
//!
//! Both subcommands run a sequential pipeline:
//! 1. **Loading**: Read the source list (text or JSON categories)
//! 2. **Fetching**: List candidates or resolve channels through an upstream
//! 3. **Selecting**: Classify, normalize, and deduplicate
//! 4. **Output**: Write one pretty-printed JSON document

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod classifier;
mod cli;
mod config;
mod dedup;
mod error;
mod format;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod resolver;
mod sources;
mod upstream;
mod utils;

use cli::{ChannelsArgs, Cli, Command, ShortsArgs};
use config::Backend;
use format::now_kst;
use pipeline::{channels::run_channels, shorts::run_shorts};
use upstream::{youtube_api::YoutubeApi, ytdlp::YtDlp};
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("yt_shorts_feed starting up");

    let args = Cli::parse();
    debug!(?args.command, "Parsed CLI arguments");

    match args.command {
        Command::Shorts(shorts) => shorts_command(shorts).await?,
        Command::Channels(channels) => channels_command(channels).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Create the output's directory and check it is writable before any
/// upstream calls are made.
async fn prepare_output(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Err(e) = ensure_writable_parent(path).await {
        error!(
            path = %path.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    Ok(())
}

async fn shorts_command(args: ShortsArgs) -> Result<(), Box<dyn Error>> {
    let config = args.shorts_config();
    let now = now_kst();

    let run = match args.backend {
        Backend::YtDlp => {
            prepare_output(&config.output_path).await?;
            run_shorts(&YtDlp::new(args.yt_dlp_config()), &config, now).await?
        }
        Backend::Api => {
            let api = YoutubeApi::new(args.api.api_config())?;
            prepare_output(&config.output_path).await?;
            run_shorts(&api, &config, now).await?
        }
    };

    info!(
        items = run.document.items.len(),
        skipped = run.skipped.len(),
        duplicates_dropped = run.duplicates_dropped,
        path = %config.output_path.display(),
        "Shorts snapshot written"
    );
    println!(
        "Wrote {} shorts to {}",
        run.document.items.len(),
        config.output_path.display()
    );
    Ok(())
}

async fn channels_command(args: ChannelsArgs) -> Result<(), Box<dyn Error>> {
    let config = args.channels_config();
    let api = YoutubeApi::new(args.api.api_config())?;
    prepare_output(&config.output_path).await?;

    let run = run_channels(&api, &config, now_kst()).await?;

    info!(
        channels = run.channel_count(),
        resolved = run.resolved,
        unresolved = run.unresolved,
        path = %config.output_path.display(),
        "Channel snapshot written"
    );
    println!(
        "Wrote {} channels to {}",
        run.channel_count(),
        config.output_path.display()
    );
    Ok(())
}
