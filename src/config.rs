//! Run configuration, built once from the CLI and passed by reference.

use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SHORTS_SOURCES: &str = "scripts/sources.txt";
pub const DEFAULT_SHORTS_OUTPUT: &str = "docs/shorts.json";
pub const DEFAULT_CHANNEL_SOURCES: &str = "scripts/youtube_channels_source.json";
pub const DEFAULT_CHANNEL_OUTPUT: &str = "docs/youtube_channels.json";
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_YT_DLP: &str = "yt-dlp";

/// Videos at or under this many seconds count as shorts.
pub const SHORTS_MAX_SECONDS: u64 = 60;
/// Recent uploads inspected per channel.
pub const SEARCH_CANDIDATES: usize = 15;
/// Upper bound on ids per `videos.list` / `channels.list` call.
pub const API_BATCH_SIZE: usize = 50;
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);
pub const YT_DLP_TIMEOUT: Duration = Duration::from_secs(120);

/// Where video listings and details come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Shell out to yt-dlp
    YtDlp,
    /// Call the YouTube Data API v3 (needs an API key)
    Api,
}

/// What makes two output items duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DedupKey {
    /// Same video id
    #[default]
    VideoId,
    /// Same originating source entry
    Source,
}

#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    pub program: PathBuf,
    pub timeout: Duration,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_YT_DLP),
            timeout: YT_DLP_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: HTTP_TIMEOUT,
        }
    }
}

/// Settings for the `shorts` pipeline.
#[derive(Debug, Clone)]
pub struct ShortsConfig {
    pub sources_path: PathBuf,
    pub output_path: PathBuf,
    pub max_short_seconds: u64,
    pub candidates_per_source: usize,
    /// When false, classification uses listing data only.
    pub resolve_details: bool,
    pub dedup: DedupKey,
}

impl Default for ShortsConfig {
    fn default() -> Self {
        Self {
            sources_path: PathBuf::from(DEFAULT_SHORTS_SOURCES),
            output_path: PathBuf::from(DEFAULT_SHORTS_OUTPUT),
            max_short_seconds: SHORTS_MAX_SECONDS,
            candidates_per_source: SEARCH_CANDIDATES,
            resolve_details: true,
            dedup: DedupKey::VideoId,
        }
    }
}

/// Settings for the `channels` pipeline.
#[derive(Debug, Clone)]
pub struct ChannelsConfig {
    pub sources_path: PathBuf,
    pub output_path: PathBuf,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            sources_path: PathBuf::from(DEFAULT_CHANNEL_SOURCES),
            output_path: PathBuf::from(DEFAULT_CHANNEL_OUTPUT),
        }
    }
}
