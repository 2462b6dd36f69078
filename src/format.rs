//! Korean-locale display strings and timestamp helpers.
//!
//! The site renders view counts and upload ages exactly as YouTube's Korean
//! UI does, so the bucket boundaries and unit suffixes here are fixed:
//!
//! | Views             | Divisor     | Suffix |
//! |-------------------|-------------|--------|
//! | `< 1,000`         | -           | `회`   |
//! | `< 10,000`        | 1,000       | `천회` |
//! | `< 100,000,000`   | 10,000      | `만회` |
//! | otherwise         | 100,000,000 | `억회` |
//!
//! All "now" values are taken in the fixed UTC+9 offset ([`KST`]).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::models::RawTimestamp;

/// Korea Standard Time, the offset every snapshot is stamped in.
pub const KST: FixedOffset = match FixedOffset::east_opt(9 * 3600) {
    Some(offset) => offset,
    None => panic!("UTC+9 is within range"),
};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Current time in [`KST`].
pub fn now_kst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&KST)
}

/// Render the `generatedAt` stamp: RFC 3339, second precision, `+09:00`.
pub fn generated_at(now: &DateTime<FixedOffset>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Format a view count with Korean magnitude units.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_views(532), "532회");
/// assert_eq!(format_views(1500), "1.5천회");
/// assert_eq!(format_views(28340), "2.8만회");
/// ```
pub fn format_views(n: u64) -> String {
    match n {
        0..=999 => format!("{n}회"),
        1_000..=9_999 => format!("{}천회", one_decimal(n as f64 / 1_000.0)),
        10_000..=99_999_999 => format!("{}만회", one_decimal(n as f64 / 10_000.0)),
        _ => format!("{}억회", one_decimal(n as f64 / 100_000_000.0)),
    }
}

/// Parse a count given as text, as the Data API reports it.
///
/// Anything that is not a non-negative integer is treated as absent.
pub fn parse_count(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

/// `format_views` for an optional count; absent counts render empty.
pub fn views_text(count: Option<u64>) -> String {
    count.map(format_views).unwrap_or_default()
}

// One decimal place, then drop a trailing zero and a bare dot ("2.0" -> "2").
fn one_decimal(value: f64) -> String {
    let text = format!("{value:.1}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Describe how long ago `published` was, relative to `now`.
///
/// Future timestamps clamp to zero elapsed seconds.
pub fn time_ago(published: DateTime<Utc>, now: DateTime<FixedOffset>) -> String {
    let elapsed = now
        .with_timezone(&Utc)
        .signed_duration_since(published)
        .num_seconds()
        .max(0);

    if elapsed < MINUTE {
        "방금 전".to_string()
    } else if elapsed < HOUR {
        format!("{}분 전", elapsed / MINUTE)
    } else if elapsed < DAY {
        format!("{}시간 전", elapsed / HOUR)
    } else if elapsed < 30 * DAY {
        format!("{}일 전", elapsed / DAY)
    } else if elapsed < 365 * DAY {
        format!("{}개월 전", elapsed / (30 * DAY))
    } else {
        format!("{}년 전", elapsed / (365 * DAY))
    }
}

/// `time_ago` for an optional upstream timestamp; unparseable or absent
/// timestamps render empty.
pub fn time_ago_text(published: Option<&RawTimestamp>, now: DateTime<FixedOffset>) -> String {
    published
        .and_then(parse_published)
        .map(|at| time_ago(at, now))
        .unwrap_or_default()
}

/// Parse any upstream publish timestamp into UTC.
///
/// Accepts epoch seconds, RFC 3339 (`2026-02-05T07:40:45Z`), offset-less
/// ISO date-times (read as UTC), and yt-dlp's `YYYYMMDD` upload dates
/// (midnight UTC).
pub fn parse_published(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::Epoch(secs) if secs.is_finite() => {
            DateTime::<Utc>::from_timestamp(secs.trunc() as i64, 0)
        }
        RawTimestamp::Epoch(_) => None,
        RawTimestamp::Text(text) => parse_published_text(text.trim()),
    }
}

fn parse_published_text(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(text, "%Y%m%d").ok()?;
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
