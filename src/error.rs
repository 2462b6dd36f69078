//! Error types shared by the loaders, upstream clients, and writers.
//!
//! Only the variants produced during setup (credentials, source files) and
//! output are fatal. Everything an upstream returns for a single channel or
//! video is caught by the pipelines, logged, and skipped.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("YOUTUBE_API_KEY is empty; provide it via the environment or --api-key")]
    MissingApiKey,
    #[error("source file not found: {0}")]
    SourceFileMissing(PathBuf),
    #[error("source file lists no channels: {0}")]
    EmptySources(PathBuf),
    #[error("invalid source file {path}: {reason}")]
    InvalidSourceFile { path: PathBuf, reason: String },
    #[error("could not resolve a channel id for {0}")]
    ChannelNotResolved(String),
    #[error("{program} failed for {target} ({status}): {stderr}")]
    ToolFailed {
        program: String,
        target: String,
        status: String,
        stderr: String,
    },
    #[error("{program} timed out after {secs}s for {target}")]
    ToolTimedOut {
        program: String,
        target: String,
        secs: u64,
    },
    #[error("{program} produced no JSON output for {target}")]
    ToolNoOutput { program: String, target: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code {status} from {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
