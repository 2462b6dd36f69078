//! Mapping upstream records onto the canonical [`ShortsItem`].
//!
//! The watch URL and thumbnail are always derived from the video id, even
//! when an upstream reports its own thumbnail, so the same video renders the
//! same way whichever backend found it.

use chrono::{DateTime, FixedOffset};

use crate::format::{time_ago_text, views_text};
use crate::models::{RawCandidate, ShortsItem, Source, VideoDetail};

pub fn short_url(video_id: &str) -> String {
    format!("https://www.youtube.com/shorts/{video_id}")
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg")
}

/// Build the output item for `candidate`, overlaying `detail` when present.
///
/// Returns `None` when the candidate has no video id. Missing text fields
/// become empty strings; a missing view count or publish time renders as an
/// empty `viewsText` / `timeAgo`.
pub fn normalize(
    candidate: &RawCandidate,
    detail: Option<&VideoDetail>,
    source: &Source,
    now: DateTime<FixedOffset>,
) -> Option<ShortsItem> {
    let merged = candidate.clone().merge_detail(detail);
    let video_id = merged.video_id.filter(|id| !id.is_empty())?;

    Some(ShortsItem {
        url: short_url(&video_id),
        thumbnail: thumbnail_url(&video_id),
        title: merged.title.unwrap_or_default(),
        uploader: merged.uploader.unwrap_or_default(),
        source: source.url.clone(),
        views_text: views_text(merged.view_count),
        time_ago: time_ago_text(merged.published.as_ref(), now),
        video_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::KST;
    use crate::models::{RawDuration, RawTimestamp};
    use chrono::TimeZone;

    fn now() -> DateTime<FixedOffset> {
        KST.with_ymd_and_hms(2026, 2, 8, 16, 40, 45).unwrap()
    }

    #[test]
    fn test_normalize_full_record() {
        let candidate = RawCandidate {
            video_id: Some("abc".to_string()),
            title: Some("listing".to_string()),
            uploader: Some("Chan".to_string()),
            duration: Some(RawDuration::Iso("PT30S".to_string())),
            published: Some(RawTimestamp::Text("2026-02-05T07:40:45Z".to_string())),
            view_count: Some(28_340),
        };
        let source = Source::from_url("https://www.youtube.com/@chan");

        let item = normalize(&candidate, None, &source, now()).unwrap();
        assert_eq!(item.video_id, "abc");
        assert_eq!(item.title, "listing");
        assert_eq!(item.uploader, "Chan");
        assert_eq!(item.source, "https://www.youtube.com/@chan");
        assert_eq!(item.url, "https://www.youtube.com/shorts/abc");
        assert_eq!(item.thumbnail, "https://i.ytimg.com/vi/abc/hqdefault.jpg");
        assert_eq!(item.views_text, "2.8만회");
        assert_eq!(item.time_ago, "3일 전");
    }

    #[test]
    fn test_normalize_tolerates_missing_fields() {
        let candidate = RawCandidate {
            video_id: Some("bare".to_string()),
            ..Default::default()
        };
        let item = normalize(&candidate, None, &Source::from_url("@x"), now()).unwrap();
        assert_eq!(item.title, "");
        assert_eq!(item.uploader, "");
        assert_eq!(item.views_text, "");
        assert_eq!(item.time_ago, "");
    }

    #[test]
    fn test_normalize_overlays_detail() {
        let candidate = RawCandidate {
            video_id: Some("abc".to_string()),
            title: Some("listing".to_string()),
            ..Default::default()
        };
        let detail = VideoDetail {
            video_id: "abc".to_string(),
            title: Some("detail".to_string()),
            view_count: Some(999),
            ..Default::default()
        };
        let item = normalize(&candidate, Some(&detail), &Source::from_url("@x"), now()).unwrap();
        assert_eq!(item.title, "detail");
        assert_eq!(item.views_text, "999회");
    }

    #[test]
    fn test_normalize_drops_missing_id() {
        let candidate = RawCandidate::default();
        assert!(normalize(&candidate, None, &Source::from_url("@x"), now()).is_none());
    }
}
