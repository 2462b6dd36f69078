//! The two snapshot pipelines.
//!
//! - [`shorts`]: one latest short per configured channel, written to
//!   `docs/shorts.json`
//! - [`channels`]: display metadata for every configured channel, grouped by
//!   category, written to `docs/youtube_channels.json`
//!
//! Both process their inputs strictly one at a time and never abort on a
//! single channel's failure; only setup and output errors are returned.

use std::fmt;

pub mod channels;
pub mod shorts;

/// Why a source produced no item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `enabled: false` in the source configuration
    Disabled,
    ChannelNotResolved,
    /// The upstream listing call failed; carries the error text
    ListingFailed(String),
    /// The listing returned nothing usable
    NoCandidates,
    /// No candidate met the duration threshold
    NoShortFound,
}

impl SkipReason {
    /// Stable label used in log fields.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Disabled => "disabled",
            SkipReason::ChannelNotResolved => "channel_not_resolved",
            SkipReason::ListingFailed(_) => "listing_failed",
            SkipReason::NoCandidates => "no_candidates",
            SkipReason::NoShortFound => "no_short_found",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ListingFailed(error) => write!(f, "{}: {error}", self.label()),
            other => f.write_str(other.label()),
        }
    }
}

/// A source that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSkip {
    pub source: String,
    pub reason: SkipReason,
}
