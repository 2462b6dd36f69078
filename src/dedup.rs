//! Removing duplicate items before the snapshot is written.

use itertools::Itertools;
use tracing::debug;

use crate::config::DedupKey;
use crate::models::ShortsItem;

/// Keep the first item for each key, preserving order.
///
/// Later duplicates are dropped silently; the number dropped is logged at
/// debug level.
pub fn dedup_items(items: Vec<ShortsItem>, key: DedupKey) -> Vec<ShortsItem> {
    let before = items.len();
    let kept: Vec<ShortsItem> = match key {
        DedupKey::VideoId => items
            .into_iter()
            .unique_by(|item| item.video_id.clone())
            .collect(),
        DedupKey::Source => items
            .into_iter()
            .unique_by(|item| item.source.clone())
            .collect(),
    };
    let dropped = before - kept.len();
    if dropped > 0 {
        debug!(dropped, ?key, "Dropped duplicate items");
    }
    kept
}
