//! Data models for channel sources, upstream candidates, and output documents.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Source`]: One configured channel reference
//! - [`RawCandidate`] / [`VideoDetail`]: Upstream video records before normalization
//! - [`ShortsItem`] / [`ShortsDocument`]: The shorts snapshot written for the site
//! - [`ChannelInfo`] / [`ChannelCategory`] / [`ChannelsDocument`]: The channel directory snapshot
//!
//! Output structs serialize with camelCase keys in declaration order, which is
//! the schema the static site reads.

use serde::{Deserialize, Serialize};

/// A channel reference loaded from the source configuration.
///
/// # Fields
///
/// * `url` - Channel URL or bare handle as written in the config
/// * `channel_id` - Pre-resolved `UC…` identifier, when the config carries one
/// * `category` - Category key or name when loaded from a grouped JSON file
/// * `enabled` - Disabled sources are echoed but never fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub url: String,
    pub channel_id: Option<String>,
    pub category: Option<String>,
    pub enabled: bool,
}

impl Source {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            channel_id: None,
            category: None,
            enabled: true,
        }
    }
}

/// A video duration as reported upstream.
///
/// The Data API reports ISO-8601 strings (`PT1M2S`); yt-dlp reports seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Seconds(f64),
    Iso(String),
}

/// A publish timestamp as reported upstream.
///
/// Either epoch seconds (yt-dlp `timestamp`) or text: RFC 3339 from the Data
/// API, `YYYYMMDD` from yt-dlp's `upload_date`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(f64),
    Text(String),
}

/// An unverified video record returned by a listing call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCandidate {
    /// Candidates without an id are dropped before classification.
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<RawDuration>,
    pub published: Option<RawTimestamp>,
    pub view_count: Option<u64>,
}

/// Extended per-video metadata from the detail resolver.
///
/// Every field other than the id may be missing; missing fields fall back to
/// whatever the listing call already reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoDetail {
    pub video_id: String,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<RawDuration>,
    pub published: Option<RawTimestamp>,
    pub view_count: Option<u64>,
}

impl RawCandidate {
    /// Overlay detail fields onto the listing record.
    pub fn merge_detail(mut self, detail: Option<&VideoDetail>) -> Self {
        let Some(detail) = detail else {
            return self;
        };
        if detail.title.is_some() {
            self.title = detail.title.clone();
        }
        if detail.uploader.is_some() {
            self.uploader = detail.uploader.clone();
        }
        if detail.duration.is_some() {
            self.duration = detail.duration.clone();
        }
        if detail.published.is_some() {
            self.published = detail.published.clone();
        }
        if detail.view_count.is_some() {
            self.view_count = detail.view_count;
        }
        self
    }
}

/// One normalized short in the output snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortsItem {
    pub video_id: String,
    pub title: String,
    pub uploader: String,
    /// The configured channel reference this item was found through.
    pub source: String,
    pub url: String,
    pub thumbnail: String,
    pub views_text: String,
    pub time_ago: String,
}

/// The shorts snapshot, rewritten in full on every run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortsDocument {
    pub generated_at: String,
    pub sources: Vec<String>,
    pub items: Vec<ShortsItem>,
}

/// Display metadata for one configured channel.
///
/// A channel that could not be resolved still appears, with its URL as the
/// title and every derived field empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub url: String,
    pub channel_id: String,
    pub enabled: bool,
    pub title: String,
    pub description: String,
    pub avatar_url: String,
    pub subscriber_count: u64,
}

impl ChannelInfo {
    pub fn unresolved(url: &str, channel_id: &str, enabled: bool) -> Self {
        Self {
            url: url.to_string(),
            channel_id: channel_id.to_string(),
            enabled,
            title: url.to_string(),
            description: String::new(),
            avatar_url: String::new(),
            subscriber_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelCategory {
    pub key: String,
    pub name: String,
    pub channels: Vec<ChannelInfo>,
}

/// The channel directory snapshot, rewritten in full on every run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsDocument {
    pub generated_at: String,
    pub categories: Vec<ChannelCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> ShortsItem {
        ShortsItem {
            video_id: "abc123".to_string(),
            title: "첫 쇼츠".to_string(),
            uploader: "Channel".to_string(),
            source: "https://www.youtube.com/@channel".to_string(),
            url: "https://www.youtube.com/shorts/abc123".to_string(),
            thumbnail: "https://i.ytimg.com/vi/abc123/hqdefault.jpg".to_string(),
            views_text: "2.8만회".to_string(),
            time_ago: "3일 전".to_string(),
        }
    }

    #[test]
    fn test_shorts_item_uses_camel_case_keys_in_order() {
        let json = serde_json::to_string(&sample_item()).unwrap();
        let keys = [
            "\"videoId\"",
            "\"title\"",
            "\"uploader\"",
            "\"source\"",
            "\"url\"",
            "\"thumbnail\"",
            "\"viewsText\"",
            "\"timeAgo\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_channel_info_serialization() {
        let info = ChannelInfo::unresolved("https://www.youtube.com/@nobody", "", true);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["channelId"], "");
        assert_eq!(json["title"], "https://www.youtube.com/@nobody");
        assert_eq!(json["avatarUrl"], "");
        assert_eq!(json["subscriberCount"], 0);
    }

    #[test]
    fn test_raw_duration_accepts_both_shapes() {
        let iso: RawDuration = serde_json::from_str("\"PT59S\"").unwrap();
        assert_eq!(iso, RawDuration::Iso("PT59S".to_string()));
        let secs: RawDuration = serde_json::from_str("45.0").unwrap();
        assert_eq!(secs, RawDuration::Seconds(45.0));
    }

    #[test]
    fn test_raw_timestamp_accepts_both_shapes() {
        let epoch: RawTimestamp = serde_json::from_str("1700000000").unwrap();
        assert_eq!(epoch, RawTimestamp::Epoch(1_700_000_000.0));
        let text: RawTimestamp = serde_json::from_str("\"20240101\"").unwrap();
        assert_eq!(text, RawTimestamp::Text("20240101".to_string()));
    }

    #[test]
    fn test_merge_detail_prefers_detail_fields() {
        let candidate = RawCandidate {
            video_id: Some("v1".to_string()),
            title: Some("listing title".to_string()),
            uploader: Some("Uploader".to_string()),
            duration: None,
            published: None,
            view_count: Some(10),
        };
        let detail = VideoDetail {
            video_id: "v1".to_string(),
            title: Some("detail title".to_string()),
            duration: Some(RawDuration::Iso("PT30S".to_string())),
            ..Default::default()
        };

        let merged = candidate.merge_detail(Some(&detail));
        assert_eq!(merged.title.as_deref(), Some("detail title"));
        assert_eq!(merged.uploader.as_deref(), Some("Uploader"));
        assert_eq!(merged.duration, Some(RawDuration::Iso("PT30S".to_string())));
        assert_eq!(merged.view_count, Some(10));
    }

    #[test]
    fn test_merge_without_detail_is_identity() {
        let candidate = RawCandidate {
            video_id: Some("v1".to_string()),
            ..Default::default()
        };
        assert_eq!(candidate.clone().merge_detail(None), candidate);
    }
}
