//! Upstream data sources for video listings, video details, and channels.
//!
//! The pipelines are generic over two traits so that the transport can be
//! swapped without touching selection or formatting:
//!
//! - [`UpstreamSource`]: list a channel's recent uploads and resolve per-video
//!   detail. Implemented by [`ytdlp::YtDlp`] and [`youtube_api::YoutubeApi`].
//! - [`ChannelDirectory`]: look channels up by handle or name and fetch their
//!   display metadata. Implemented by [`youtube_api::YoutubeApi`].
//!
//! | Backend | Listing | Detail | Notes |
//! |---------|---------|--------|-------|
//! | yt-dlp | `--flat-playlist -j` on the channel's shorts tab | `-j` per video | No credentials needed |
//! | Data API | `search.list` ordered by date | `videos.list`, 50 ids per call | Needs `YOUTUBE_API_KEY` |

use tracing::{debug, warn};

use crate::error::FeedError;
use crate::models::{RawCandidate, Source, VideoDetail};

pub mod youtube_api;
pub mod ytdlp;

/// A source of recent videos for a channel.
pub trait UpstreamSource {
    /// Short backend name used in log fields.
    fn name(&self) -> &'static str;

    /// List up to `limit` recent uploads for `source`, newest first where the
    /// backend allows it.
    ///
    /// # Errors
    ///
    /// [`FeedError::ChannelNotResolved`] when the source cannot be mapped to a
    /// channel, or any transport error. Both skip only this source.
    async fn list_candidates(
        &self,
        source: &Source,
        limit: usize,
    ) -> Result<Vec<RawCandidate>, FeedError>;

    /// Fetch extended metadata for one video.
    ///
    /// `Ok(None)` means the upstream answered but knows nothing about the id.
    async fn fetch_detail(&self, video_id: &str) -> Result<Option<VideoDetail>, FeedError>;

    /// Fetch details for many videos.
    ///
    /// Failures are per item: a video whose lookup fails is logged and left
    /// out of the result, and the caller treats it as having no detail.
    async fn fetch_details(&self, video_ids: &[String]) -> Vec<VideoDetail> {
        let mut details = Vec::with_capacity(video_ids.len());
        for video_id in video_ids {
            match self.fetch_detail(video_id).await {
                Ok(Some(detail)) => details.push(detail),
                Ok(None) => debug!(%video_id, upstream = self.name(), "No detail returned"),
                Err(e) => warn!(
                    %video_id,
                    upstream = self.name(),
                    error = %e,
                    "Detail fetch failed; continuing without detail"
                ),
            }
        }
        details
    }
}

/// Display metadata for a channel as returned by the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub avatar_url: String,
    pub subscriber_count: u64,
}

/// Channel lookups used by the channel resolver.
pub trait ChannelDirectory {
    /// Resolve an `@handle` (without the `@`) to a channel id.
    async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, FeedError>;

    /// Full-text channel search; returns the top hit's id.
    async fn search_channel_id(&self, query: &str) -> Result<Option<String>, FeedError>;

    /// Fetch display metadata for up to 50 channel ids.
    ///
    /// Ids unknown upstream are simply absent from the result.
    async fn fetch_channels(&self, channel_ids: &[String]) -> Result<Vec<ChannelRecord>, FeedError>;
}
