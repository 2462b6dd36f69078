//! Loading the channel source configuration.
//!
//! Two formats are accepted:
//!
//! - A flat text list, one channel URL per line. Blank lines and lines
//!   starting with `#` are ignored.
//! - A grouped JSON document:
//!
//! ```text
//! { "categories": [ { "key": "music", "name": "Music",
//!     "channels": [ { "url": "https://www.youtube.com/@x", "channelId": "UC…", "enabled": true } ] } ] }
//! ```
//!
//! A file is read as JSON when its extension is `.json` or its first
//! non-whitespace character is `{`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::error::FeedError;
use crate::models::Source;

/// The grouped JSON source document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceFile {
    #[serde(default)]
    pub categories: Vec<SourceCategory>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceCategory {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Entries that are not channel objects are dropped while parsing.
    #[serde(default, deserialize_with = "channel_entries")]
    pub channels: Option<Vec<SourceChannel>>,
}

fn channel_entries<'de, D>(deserializer: D) -> Result<Option<Vec<SourceChannel>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(entries) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let channels = entries
        .into_iter()
        .filter_map(|entry| {
            if !entry.is_object() {
                debug!(%entry, "Skipping channel entry that is not an object");
                return None;
            }
            match serde_json::from_value::<SourceChannel>(entry) {
                Ok(channel) => Some(channel),
                Err(e) => {
                    debug!(error = %e, "Skipping malformed channel entry");
                    None
                }
            }
        })
        .collect();
    Ok(Some(channels))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceChannel {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "channelId")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl SourceCategory {
    pub fn key(&self) -> String {
        trimmed(self.key.as_deref())
    }

    pub fn name(&self) -> String {
        trimmed(self.name.as_deref())
    }

    pub fn channels(&self) -> &[SourceChannel] {
        self.channels.as_deref().unwrap_or_default()
    }
}

impl SourceChannel {
    /// The trimmed URL, or `None` when absent or blank.
    pub fn url(&self) -> Option<String> {
        non_empty(self.url.as_deref())
    }

    pub fn channel_id(&self) -> Option<String> {
        non_empty(self.channel_id.as_deref())
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

impl SourceFile {
    /// Flatten every channel with a URL into a [`Source`], in file order.
    pub fn sources(&self) -> Vec<Source> {
        let mut sources = Vec::new();
        for category in &self.categories {
            let label = non_empty(category.key.as_deref())
                .or_else(|| non_empty(category.name.as_deref()));
            for channel in category.channels() {
                let Some(url) = channel.url() else {
                    continue;
                };
                sources.push(Source {
                    url,
                    channel_id: channel.channel_id(),
                    category: label.clone(),
                    enabled: channel.enabled(),
                });
            }
        }
        sources
    }

    /// Channel entries with a usable URL. Entries without one are never output.
    pub fn channel_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.channels())
            .filter(|channel| channel.url().is_some())
            .count()
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a flat newline-delimited source list.
pub fn parse_source_list(text: &str) -> Vec<Source> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Source::from_url)
        .collect()
}

/// Parse a grouped JSON source document.
pub fn parse_source_json(text: &str, path: &Path) -> Result<SourceFile, FeedError> {
    serde_json::from_str(text).map_err(|e| FeedError::InvalidSourceFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn looks_like_json(path: &Path, text: &str) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        || text.trim_start().starts_with('{')
}

async fn read_source_text(path: &Path) -> Result<String, FeedError> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FeedError::SourceFileMissing(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Load the shorts pipeline's sources from a text or JSON file.
///
/// # Errors
///
/// Fatal when the file is missing, malformed, or lists no channels.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_sources(path: &Path) -> Result<Vec<Source>, FeedError> {
    let text = read_source_text(path).await?;
    let sources = if looks_like_json(path, &text) {
        parse_source_json(&text, path)?.sources()
    } else {
        parse_source_list(&text)
    };

    if sources.is_empty() {
        return Err(FeedError::EmptySources(path.to_path_buf()));
    }
    info!(count = sources.len(), "Loaded sources");
    Ok(sources)
}

/// Load the channel pipeline's grouped JSON source file.
///
/// # Errors
///
/// Fatal when the file is missing, is not a JSON category document, or has
/// no channel entries at all.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_source_file(path: &Path) -> Result<SourceFile, FeedError> {
    let text = read_source_text(path).await?;
    let file = parse_source_json(&text, path)?;
    if file.channel_count() == 0 {
        return Err(FeedError::EmptySources(path.to_path_buf()));
    }
    info!(
        categories = file.categories.len(),
        channels = file.channel_count(),
        "Loaded channel source file"
    );
    Ok(file)
}
