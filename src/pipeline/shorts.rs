//! Latest-short selection for every configured channel.
//!
//! Per source: list recent uploads, resolve details for the ones that might
//! still be shorts, merge, classify, and normalize. Accepted items are then
//! deduplicated and written as a single [`ShortsDocument`].

use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::classifier::{duration_seconds, pick_latest_listed, pick_latest_short};
use crate::config::ShortsConfig;
use crate::dedup::dedup_items;
use crate::error::FeedError;
use crate::format::generated_at;
use crate::models::{RawCandidate, ShortsDocument, ShortsItem, Source, VideoDetail};
use crate::normalize::normalize;
use crate::outputs::json::write_document;
use crate::pipeline::{SkipReason, SourceSkip};
use crate::sources::load_sources;
use crate::upstream::UpstreamSource;

/// Outcome of one shorts run.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortsRun {
    pub document: ShortsDocument,
    pub skipped: Vec<SourceSkip>,
    pub duplicates_dropped: usize,
}

/// Load sources, collect one short per source, and write the snapshot.
///
/// # Errors
///
/// Only setup and output failures are returned: a missing or empty source
/// file, or a failed write. Per-source problems end up in
/// [`ShortsRun::skipped`].
#[instrument(level = "info", skip_all, fields(upstream = upstream.name()))]
pub async fn run_shorts<U: UpstreamSource>(
    upstream: &U,
    config: &ShortsConfig,
    now: DateTime<FixedOffset>,
) -> Result<ShortsRun, FeedError> {
    let sources = load_sources(&config.sources_path).await?;
    let run = collect_shorts(upstream, &sources, config, now).await;
    write_document(&run.document, &config.output_path).await?;
    Ok(run)
}

/// Build the shorts document for `sources` without touching the filesystem.
#[instrument(level = "info", skip_all, fields(upstream = upstream.name(), sources = sources.len()))]
pub async fn collect_shorts<U: UpstreamSource>(
    upstream: &U,
    sources: &[Source],
    config: &ShortsConfig,
    now: DateTime<FixedOffset>,
) -> ShortsRun {
    let mut items = Vec::new();
    let mut skipped = Vec::new();

    for source in sources {
        match latest_short_for(upstream, source, config, now).await {
            Ok(item) => {
                info!(
                    source = %source.url,
                    category = source.category.as_deref().unwrap_or_default(),
                    video_id = %item.video_id,
                    "Selected short"
                );
                items.push(item);
            }
            Err(reason) => {
                warn!(
                    source = %source.url,
                    reason = reason.label(),
                    detail = %reason,
                    "Skipping source"
                );
                skipped.push(SourceSkip {
                    source: source.url.clone(),
                    reason,
                });
            }
        }
    }

    let accepted = items.len();
    let items = dedup_items(items, config.dedup);
    let duplicates_dropped = accepted - items.len();

    info!(
        items = items.len(),
        skipped = skipped.len(),
        duplicates_dropped,
        "Collected shorts"
    );

    ShortsRun {
        document: ShortsDocument {
            generated_at: generated_at(&now),
            sources: sources.iter().map(|s| s.url.clone()).collect(),
            items,
        },
        skipped,
        duplicates_dropped,
    }
}

async fn latest_short_for<U: UpstreamSource>(
    upstream: &U,
    source: &Source,
    config: &ShortsConfig,
    now: DateTime<FixedOffset>,
) -> Result<ShortsItem, SkipReason> {
    if !source.enabled {
        return Err(SkipReason::Disabled);
    }

    let candidates: Vec<RawCandidate> = match upstream
        .list_candidates(source, config.candidates_per_source)
        .await
    {
        Ok(candidates) => candidates
            .into_iter()
            .filter(|c| c.video_id.as_deref().is_some_and(|id| !id.is_empty()))
            .collect(),
        Err(FeedError::ChannelNotResolved(_)) => return Err(SkipReason::ChannelNotResolved),
        Err(e) => return Err(SkipReason::ListingFailed(e.to_string())),
    };
    if candidates.is_empty() {
        return Err(SkipReason::NoCandidates);
    }
    debug!(source = %source.url, count = candidates.len(), "Listed candidates");

    let details = if config.resolve_details {
        resolve_details(upstream, &candidates, config.max_short_seconds).await
    } else {
        HashMap::new()
    };

    let merged: Vec<RawCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let detail = candidate.video_id.as_ref().and_then(|id| details.get(id));
            candidate.merge_detail(detail)
        })
        .collect();

    let best = if config.resolve_details {
        pick_latest_short(&merged, config.max_short_seconds)
    } else {
        pick_latest_listed(&merged, config.max_short_seconds)
    };
    best.and_then(|best| normalize(best, None, source, now))
        .ok_or(SkipReason::NoShortFound)
}

/// Fetch details for candidates the listing has not already ruled out.
///
/// A candidate whose listed duration is over the threshold cannot become a
/// short, so its detail lookup is skipped.
async fn resolve_details<U: UpstreamSource>(
    upstream: &U,
    candidates: &[RawCandidate],
    max_seconds: u64,
) -> HashMap<String, VideoDetail> {
    let ids: Vec<String> = candidates
        .iter()
        .filter(|c| duration_seconds(c.duration.as_ref()).is_none_or(|secs| secs <= max_seconds))
        .filter_map(|c| c.video_id.clone())
        .collect();
    if ids.is_empty() {
        return HashMap::new();
    }

    upstream
        .fetch_details(&ids)
        .await
        .into_iter()
        .map(|detail| (detail.video_id.clone(), detail))
        .collect()
}
