//! Command-line interface definitions for yt_shorts_feed.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials and the yt-dlp location can also come from environment
//! variables.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    ApiConfig, Backend, ChannelsConfig, DEFAULT_API_BASE_URL, DEFAULT_CHANNEL_OUTPUT,
    DEFAULT_CHANNEL_SOURCES, DEFAULT_SHORTS_OUTPUT, DEFAULT_SHORTS_SOURCES, DEFAULT_YT_DLP,
    DedupKey, SEARCH_CANDIDATES, SHORTS_MAX_SECONDS, ShortsConfig, YT_DLP_TIMEOUT,
    YtDlpConfig,
};

/// Command-line arguments for yt_shorts_feed.
///
/// # Examples
///
/// ```sh
/// # Latest short per channel via yt-dlp
/// yt_shorts_feed shorts --sources scripts/sources.txt
///
/// # Same, through the Data API
/// YOUTUBE_API_KEY=... yt_shorts_feed shorts --backend api
///
/// # Channel directory snapshot
/// YOUTUBE_API_KEY=... yt_shorts_feed channels
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the latest short of every configured channel
    Shorts(ShortsArgs),
    /// Write display metadata for every configured channel, by category
    Channels(ChannelsArgs),
}

/// Data API connection options shared by both subcommands.
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// YouTube Data API v3 key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Data API base URL
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,
}

impl ApiArgs {
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_base_url.clone(),
            ..ApiConfig::new(self.api_key.clone().unwrap_or_default())
        }
    }
}

#[derive(Args, Debug)]
pub struct ShortsArgs {
    /// Source list: newline-delimited URLs or a JSON category document
    #[arg(short, long, default_value = DEFAULT_SHORTS_SOURCES)]
    pub sources: PathBuf,

    /// Output JSON file
    #[arg(short, long, default_value = DEFAULT_SHORTS_OUTPUT)]
    pub output: PathBuf,

    /// Where listings and video details come from
    #[arg(short, long, value_enum, default_value_t = Backend::YtDlp)]
    pub backend: Backend,

    #[command(flatten)]
    pub api: ApiArgs,

    /// Longest duration, in seconds, that still counts as a short
    #[arg(long, default_value_t = SHORTS_MAX_SECONDS)]
    pub max_seconds: u64,

    /// Recent uploads inspected per channel
    #[arg(long, default_value_t = SEARCH_CANDIDATES)]
    pub candidates: usize,

    /// What makes two items duplicates
    #[arg(long, value_enum, default_value_t = DedupKey::VideoId)]
    pub dedup: DedupKey,

    /// Classify from listing data only, without per-video detail lookups
    #[arg(long)]
    pub skip_details: bool,

    /// yt-dlp executable
    #[arg(long = "yt-dlp", env = "YT_DLP_PATH", default_value = DEFAULT_YT_DLP)]
    pub yt_dlp: PathBuf,

    /// Kill a yt-dlp invocation after this many seconds
    #[arg(long, default_value_t = YT_DLP_TIMEOUT.as_secs())]
    pub yt_dlp_timeout_secs: u64,
}

impl ShortsArgs {
    pub fn shorts_config(&self) -> ShortsConfig {
        ShortsConfig {
            sources_path: self.sources.clone(),
            output_path: self.output.clone(),
            max_short_seconds: self.max_seconds,
            candidates_per_source: self.candidates,
            resolve_details: !self.skip_details,
            dedup: self.dedup,
        }
    }

    pub fn yt_dlp_config(&self) -> YtDlpConfig {
        YtDlpConfig {
            program: self.yt_dlp.clone(),
            timeout: Duration::from_secs(self.yt_dlp_timeout_secs),
        }
    }
}

#[derive(Args, Debug)]
pub struct ChannelsArgs {
    /// JSON category document listing the channels
    #[arg(short, long, default_value = DEFAULT_CHANNEL_SOURCES)]
    pub sources: PathBuf,

    /// Output JSON file
    #[arg(short, long, default_value = DEFAULT_CHANNEL_OUTPUT)]
    pub output: PathBuf,

    #[command(flatten)]
    pub api: ApiArgs,
}

impl ChannelsArgs {
    pub fn channels_config(&self) -> ChannelsConfig {
        ChannelsConfig {
            sources_path: self.sources.clone(),
            output_path: self.output.clone(),
        }
    }
}
