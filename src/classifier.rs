//! Shorts classification: duration parsing and latest-short selection.
//!
//! A video counts as a short when its duration is at most the configured
//! threshold (60 seconds by default). Durations that are missing or cannot be
//! parsed never qualify, except in listing-only mode where a missing duration
//! is trusted.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::format::parse_published;
use crate::models::{RawCandidate, RawDuration};

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("duration pattern is valid")
});

/// Parse the `PT[nH][nM][nS]` subset of ISO-8601 durations into seconds.
///
/// Returns `None` for an empty string, for bare `PT`, and for anything
/// outside the subset (day components, fractional seconds).
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_iso8601_duration("PT1M2S"), Some(62));
/// assert_eq!(parse_iso8601_duration("PT2H"), Some(7200));
/// assert_eq!(parse_iso8601_duration("P1D"), None);
/// ```
pub fn parse_iso8601_duration(text: &str) -> Option<u64> {
    let caps = ISO_DURATION.captures(text.trim())?;
    if caps.iter().skip(1).all(|group| group.is_none()) {
        return None;
    }
    let part = |index: usize| -> Option<u64> {
        match caps.get(index) {
            Some(m) => m.as_str().parse::<u64>().ok(),
            None => Some(0),
        }
    };
    let hours = part(1)?;
    let minutes = part(2)?;
    let seconds = part(3)?;
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

/// Whole seconds of an upstream duration, rounding fractional seconds up.
pub fn duration_seconds(duration: Option<&RawDuration>) -> Option<u64> {
    match duration? {
        RawDuration::Seconds(secs) if secs.is_finite() && *secs >= 0.0 => {
            Some(secs.ceil() as u64)
        }
        RawDuration::Seconds(_) => None,
        RawDuration::Iso(text) => parse_iso8601_duration(text),
    }
}

/// Whether a candidate's duration is known and within `max_seconds`.
pub fn is_short(candidate: &RawCandidate, max_seconds: u64) -> bool {
    duration_seconds(candidate.duration.as_ref()).is_some_and(|secs| secs <= max_seconds)
}

/// Whether a listing-only candidate may be a short.
///
/// Listings from a shorts tab or a channel search usually omit durations, so
/// a missing duration is trusted here. A duration that is present still has
/// to parse and be within `max_seconds`.
pub fn is_listed_short(candidate: &RawCandidate, max_seconds: u64) -> bool {
    match &candidate.duration {
        None => true,
        Some(_) => is_short(candidate, max_seconds),
    }
}

/// Pick the most recently published short among `candidates`.
///
/// Candidates without a video id or a qualifying duration are ignored.
/// Candidates without a parseable publish time rank below all dated ones.
/// Equal publish times keep the earlier candidate.
pub fn pick_latest_short(candidates: &[RawCandidate], max_seconds: u64) -> Option<&RawCandidate> {
    pick_latest(candidates, |c| is_short(c, max_seconds))
}

/// [`pick_latest_short`] for listing data without per-video detail, where a
/// missing duration counts as a short (see [`is_listed_short`]).
pub fn pick_latest_listed(candidates: &[RawCandidate], max_seconds: u64) -> Option<&RawCandidate> {
    pick_latest(candidates, |c| is_listed_short(c, max_seconds))
}

fn pick_latest(
    candidates: &[RawCandidate],
    qualifies: impl Fn(&RawCandidate) -> bool,
) -> Option<&RawCandidate> {
    let mut best: Option<(&RawCandidate, Option<DateTime<Utc>>)> = None;

    for candidate in candidates {
        if candidate.video_id.is_none() {
            continue;
        }
        if !qualifies(candidate) {
            debug!(
                video_id = candidate.video_id.as_deref().unwrap_or_default(),
                duration = ?candidate.duration,
                "Not a short"
            );
            continue;
        }
        let published = candidate.published.as_ref().and_then(parse_published);
        let newer = match &best {
            Some((_, best_published)) => published > *best_published,
            None => true,
        };
        if newer {
            best = Some((candidate, published));
        }
    }

    best.map(|(candidate, _)| candidate)
}
