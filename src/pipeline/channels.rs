//! Channel directory snapshot.
//!
//! Three passes over the grouped source file:
//!
//! 1. Resolve every enabled channel URL to an id (cached per URL)
//! 2. Fetch metadata for the distinct ids, [`API_BATCH_SIZE`] per call
//! 3. Rebuild the categories in input order, falling back to the URL as the
//!    title wherever metadata is missing

use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::config::{API_BATCH_SIZE, ChannelsConfig};
use crate::error::FeedError;
use crate::format::generated_at;
use crate::models::{ChannelCategory, ChannelInfo, ChannelsDocument};
use crate::outputs::json::write_document;
use crate::resolver::resolve_channel_id;
use crate::sources::{SourceChannel, SourceFile, load_source_file};
use crate::upstream::{ChannelDirectory, ChannelRecord};

/// Outcome of one channels run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelsRun {
    pub document: ChannelsDocument,
    /// Enabled channel URLs that resolved to an id.
    pub resolved: usize,
    /// Enabled channel URLs that did not.
    pub unresolved: usize,
}

impl ChannelsRun {
    pub fn channel_count(&self) -> usize {
        self.document
            .categories
            .iter()
            .map(|category| category.channels.len())
            .sum()
    }
}

/// Load the grouped source file, resolve every channel, and write the snapshot.
///
/// # Errors
///
/// Returns an error if the source file is missing, malformed, or lists no
/// channels, or if the snapshot cannot be written. Lookup failures never
/// abort the run.
#[instrument(level = "info", skip_all, fields(sources = %config.sources_path.display()))]
pub async fn run_channels<D: ChannelDirectory>(
    directory: &D,
    config: &ChannelsConfig,
    now: DateTime<FixedOffset>,
) -> Result<ChannelsRun, FeedError> {
    let file = load_source_file(&config.sources_path).await?;
    let run = collect_channels(directory, &file, now).await;
    write_document(&run.document, &config.output_path).await?;
    Ok(run)
}

#[instrument(level = "info", skip_all, fields(categories = file.categories.len()))]
pub async fn collect_channels<D: ChannelDirectory>(
    directory: &D,
    file: &SourceFile,
    now: DateTime<FixedOffset>,
) -> ChannelsRun {
    let resolved = resolve_all(directory, file).await;

    let mut ids: Vec<String> = Vec::new();
    for id in resolved.values().flatten() {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    // HashMap iteration order is arbitrary; keep request batches stable.
    ids.sort();
    let records = fetch_records(directory, &ids).await;

    let categories = file
        .categories
        .iter()
        .map(|category| ChannelCategory {
            key: category.key(),
            name: category.name(),
            channels: category
                .channels()
                .iter()
                .filter_map(|channel| channel_info(channel, &resolved, &records))
                .collect(),
        })
        .collect();

    let unresolved = resolved.values().filter(|id| id.is_none()).count();
    let run = ChannelsRun {
        document: ChannelsDocument {
            generated_at: generated_at(&now),
            categories,
        },
        resolved: resolved.len() - unresolved,
        unresolved,
    };
    info!(
        channels = run.channel_count(),
        resolved = run.resolved,
        unresolved = run.unresolved,
        fetched = records.len(),
        "Collected channel metadata"
    );
    run
}

/// Resolve each distinct enabled URL once. Unresolved URLs map to `None`.
async fn resolve_all<D: ChannelDirectory>(
    directory: &D,
    file: &SourceFile,
) -> HashMap<String, Option<String>> {
    let mut resolved: HashMap<String, Option<String>> = HashMap::new();

    for channel in file.categories.iter().flat_map(|c| c.channels()) {
        let Some(url) = channel.url() else {
            continue;
        };
        if !channel.enabled() || resolved.contains_key(&url) {
            continue;
        }

        let outcome = resolve_channel_id(directory, &url, channel.channel_id().as_deref()).await;
        match &outcome {
            Some(found) => debug!(
                %url,
                channel_id = %found.channel_id,
                resolved_by = %found.resolved_by,
                "Resolved channel"
            ),
            None => warn!(
                %url,
                reason = "channel_not_resolved",
                "Keeping channel without metadata"
            ),
        }
        resolved.insert(url, outcome.map(|found| found.channel_id));
    }

    resolved
}

async fn fetch_records<D: ChannelDirectory>(
    directory: &D,
    ids: &[String],
) -> HashMap<String, ChannelRecord> {
    let mut records = HashMap::new();
    for batch in ids.chunks(API_BATCH_SIZE) {
        match directory.fetch_channels(batch).await {
            Ok(found) => {
                for record in found {
                    records.insert(record.channel_id.clone(), record);
                }
            }
            Err(e) => warn!(
                batch = batch.len(),
                error = %e,
                "Channel metadata batch failed; affected channels keep fallback fields"
            ),
        }
    }
    records
}

fn channel_info(
    channel: &SourceChannel,
    resolved: &HashMap<String, Option<String>>,
    records: &HashMap<String, ChannelRecord>,
) -> Option<ChannelInfo> {
    let url = channel.url()?;
    let enabled = channel.enabled();
    let channel_id = channel
        .channel_id()
        .or_else(|| resolved.get(&url).cloned().flatten())
        .unwrap_or_default();

    let record = records.get(&channel_id).filter(|_| enabled);
    Some(match record {
        Some(record) => ChannelInfo {
            title: if record.title.trim().is_empty() {
                url.clone()
            } else {
                record.title.clone()
            },
            url,
            channel_id,
            enabled,
            description: record.description.clone(),
            avatar_url: record.avatar_url.clone(),
            subscriber_count: record.subscriber_count,
        },
        None => ChannelInfo::unresolved(&url, &channel_id, enabled),
    })
}
