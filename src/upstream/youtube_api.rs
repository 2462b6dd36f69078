//! YouTube Data API v3 client.
//!
//! The client makes five kinds of call:
//!
//! | Call | Endpoint | Purpose |
//! |------|----------|---------|
//! | handle lookup | `channels?part=id&forHandle=` | `@handle` → channel id |
//! | channel search | `search?type=channel&q=` | name → channel id (fallback) |
//! | recent uploads | `search?channelId=&order=date&type=video` | candidate ids |
//! | details | `videos?part=snippet,statistics,contentDetails` | duration, views, publish time |
//! | channel info | `channels?part=snippet,statistics` | title, avatar, subscribers |
//!
//! Every request carries the API key as the `key` query parameter.

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::config::{API_BATCH_SIZE, ApiConfig};
use crate::error::FeedError;
use crate::format::parse_count;
use crate::models::{RawCandidate, RawDuration, RawTimestamp, Source, VideoDetail};
use crate::resolver::resolve_channel_id;
use crate::upstream::{ChannelDirectory, ChannelRecord, UpstreamSource};
use crate::utils::truncate_for_log;

/// Counts arrive as decimal strings, but accept plain numbers too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Count {
    Number(u64),
    Text(String),
}

impl Count {
    fn value(&self) -> Option<u64> {
        match self {
            Count::Number(n) => Some(*n),
            Count::Text(text) => parse_count(text),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    /// First non-empty URL among `high`, `medium`, `default`.
    fn best_url(&self) -> Option<String> {
        [&self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .filter_map(|thumb| thumb.url.clone())
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
    channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    title: Option<String>,
    channel_title: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    id: Option<SearchId>,
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelIdOnly {
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    title: Option<String>,
    description: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<Count>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelResource {
    id: Option<String>,
    snippet: Option<ChannelSnippet>,
    statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: Option<String>,
    channel_title: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<Count>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: Option<String>,
    snippet: Option<VideoSnippet>,
    statistics: Option<VideoStatistics>,
    content_details: Option<ContentDetails>,
}

impl From<SearchResult> for RawCandidate {
    fn from(result: SearchResult) -> Self {
        let snippet = result.snippet.unwrap_or_default();
        RawCandidate {
            video_id: result.id.and_then(|id| id.video_id),
            title: snippet.title,
            uploader: snippet.channel_title,
            duration: None,
            published: snippet.published_at.map(RawTimestamp::Text),
            view_count: None,
        }
    }
}

impl VideoResource {
    fn into_detail(self) -> Option<VideoDetail> {
        let video_id = self.id.filter(|id| !id.is_empty())?;
        let snippet = self.snippet.unwrap_or_default();
        Some(VideoDetail {
            video_id,
            title: snippet.title,
            uploader: snippet.channel_title,
            duration: self
                .content_details
                .and_then(|details| details.duration)
                .map(RawDuration::Iso),
            published: snippet.published_at.map(RawTimestamp::Text),
            view_count: self
                .statistics
                .and_then(|stats| stats.view_count)
                .and_then(|count| count.value()),
        })
    }
}

impl ChannelResource {
    fn into_record(self) -> Option<ChannelRecord> {
        let channel_id = self.id.filter(|id| !id.is_empty())?;
        let snippet = self.snippet.unwrap_or_default();
        Some(ChannelRecord {
            channel_id,
            title: snippet.title.unwrap_or_default(),
            description: snippet.description.unwrap_or_default(),
            avatar_url: snippet
                .thumbnails
                .and_then(|thumbs| thumbs.best_url())
                .unwrap_or_default(),
            subscriber_count: self
                .statistics
                .and_then(|stats| stats.subscriber_count)
                .and_then(|count| count.value())
                .unwrap_or(0),
        })
    }
}

/// Data API client, shared by both pipelines.
#[derive(Debug, Clone)]
pub struct YoutubeApi {
    client: Client,
    config: ApiConfig,
}

impl YoutubeApi {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// [`FeedError::MissingApiKey`] when the key is blank; this is a startup
    /// failure and aborts the run.
    pub fn new(config: ApiConfig) -> Result<Self, FeedError> {
        if config.api_key.trim().is_empty() {
            return Err(FeedError::MissingApiKey);
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[instrument(level = "debug", skip(self, params))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FeedError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.config.api_key.trim())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                endpoint,
                status = status.as_u16(),
                body = %truncate_for_log(&body, 300),
                "Data API returned an error"
            );
            return Err(FeedError::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn videos(&self, video_ids: &[String]) -> Result<Vec<VideoDetail>, FeedError> {
        let ids = video_ids.join(",");
        let response: ListResponse<VideoResource> = self
            .get_json(
                "videos",
                &[("part", "snippet,statistics,contentDetails"), ("id", &ids)],
            )
            .await?;
        Ok(response
            .items
            .into_iter()
            .filter_map(VideoResource::into_detail)
            .collect())
    }
}

impl UpstreamSource for YoutubeApi {
    fn name(&self) -> &'static str {
        "youtube_api"
    }

    #[instrument(level = "info", skip_all, fields(source = %source.url))]
    async fn list_candidates(
        &self,
        source: &Source,
        limit: usize,
    ) -> Result<Vec<RawCandidate>, FeedError> {
        let resolved = resolve_channel_id(self, &source.url, source.channel_id.as_deref())
            .await
            .ok_or_else(|| FeedError::ChannelNotResolved(source.url.clone()))?;
        debug!(
            channel_id = %resolved.channel_id,
            resolved_by = %resolved.resolved_by,
            "Resolved channel"
        );

        let max_results = limit.clamp(1, API_BATCH_SIZE).to_string();
        let response: ListResponse<SearchResult> = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", &resolved.channel_id),
                    ("order", "date"),
                    ("maxResults", &max_results),
                    ("type", "video"),
                ],
            )
            .await?;

        let candidates: Vec<RawCandidate> =
            response.items.into_iter().map(RawCandidate::from).collect();
        info!(count = candidates.len(), "Listed recent uploads");
        Ok(candidates)
    }

    async fn fetch_detail(&self, video_id: &str) -> Result<Option<VideoDetail>, FeedError> {
        let details = self.videos(&[video_id.to_string()]).await?;
        Ok(details.into_iter().find(|d| d.video_id == video_id))
    }

    #[instrument(level = "info", skip_all, fields(count = video_ids.len()))]
    async fn fetch_details(&self, video_ids: &[String]) -> Vec<VideoDetail> {
        let mut details = Vec::with_capacity(video_ids.len());
        for chunk in video_ids.chunks(API_BATCH_SIZE) {
            match self.videos(chunk).await {
                Ok(batch) => details.extend(batch),
                Err(e) => warn!(
                    ids = %chunk.join(","),
                    error = %e,
                    "Detail batch failed; continuing without detail"
                ),
            }
        }
        details
    }
}

impl ChannelDirectory for YoutubeApi {
    async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, FeedError> {
        let response: ListResponse<ChannelIdOnly> = self
            .get_json("channels", &[("part", "id"), ("forHandle", handle)])
            .await?;
        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id)
            .find(|id| !id.is_empty()))
    }

    async fn search_channel_id(&self, query: &str) -> Result<Option<String>, FeedError> {
        let response: ListResponse<SearchResult> = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "channel"),
                    ("maxResults", "1"),
                ],
            )
            .await?;
        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id.and_then(|id| id.channel_id))
            .find(|id| !id.is_empty()))
    }

    async fn fetch_channels(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelRecord>, FeedError> {
        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = channel_ids.join(",");
        let response: ListResponse<ChannelResource> = self
            .get_json("channels", &[("part", "snippet,statistics"), ("id", &ids)])
            .await?;
        Ok(response
            .items
            .into_iter()
            .filter_map(ChannelResource::into_record)
            .collect())
    }
}
