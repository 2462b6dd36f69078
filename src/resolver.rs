//! Channel resolution: from a configured URL to a `UC…` channel id.
//!
//! Methods are tried in order and the first success wins:
//!
//! 1. An explicit `channelId` from the source configuration
//! 2. A literal `/channel/UC…` path segment in the URL
//! 3. An `@handle` looked up through the directory
//! 4. A channel search on the handle, or on the legacy `/c/<name>` or
//!    `/user/<name>` segment
//!
//! Lookup errors are logged and fall through to the next method.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::{debug, instrument, warn};

use crate::upstream::ChannelDirectory;

static CHANNEL_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/channel/(UC[A-Za-z0-9_-]+)").expect("channel pattern is valid"));
static HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|/)@([^/?#\s]+)").expect("handle pattern is valid"));
static LEGACY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:c|user)/([^/?#\s]+)").expect("legacy pattern is valid"));

/// How a channel id was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Config,
    UrlPath,
    Handle,
    Search,
}

impl fmt::Display for ResolvedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResolvedBy::Config => "config",
            ResolvedBy::UrlPath => "url_path",
            ResolvedBy::Handle => "handle",
            ResolvedBy::Search => "search",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChannel {
    pub channel_id: String,
    pub resolved_by: ResolvedBy,
}

/// Extract a `UC…` id from a `/channel/<id>` URL.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(extract_channel_id("https://www.youtube.com/channel/UCabc/videos"), Some("UCabc".into()));
/// ```
pub fn extract_channel_id(url: &str) -> Option<String> {
    CHANNEL_PATH
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the handle (without `@`) from `https://www.youtube.com/@name/...`
/// or a bare `@name`.
pub fn extract_handle(url: &str) -> Option<String> {
    HANDLE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_legacy_name(url: &str) -> Option<String> {
    LEGACY_NAME
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolve `url` to a channel id, or `None` when every method fails.
#[instrument(level = "debug", skip(directory))]
pub async fn resolve_channel_id<D: ChannelDirectory>(
    directory: &D,
    url: &str,
    configured_id: Option<&str>,
) -> Option<ResolvedChannel> {
    if let Some(id) = configured_id.map(str::trim).filter(|id| !id.is_empty()) {
        return Some(ResolvedChannel {
            channel_id: id.to_string(),
            resolved_by: ResolvedBy::Config,
        });
    }

    if let Some(id) = extract_channel_id(url) {
        return Some(ResolvedChannel {
            channel_id: id,
            resolved_by: ResolvedBy::UrlPath,
        });
    }

    let handle = extract_handle(url);
    if let Some(handle) = handle.as_deref() {
        match directory.channel_id_for_handle(handle).await {
            Ok(Some(id)) => {
                return Some(ResolvedChannel {
                    channel_id: id,
                    resolved_by: ResolvedBy::Handle,
                });
            }
            Ok(None) => debug!(%url, handle, "Handle lookup found nothing"),
            Err(e) => warn!(%url, handle, error = %e, "Handle lookup failed"),
        }
    }

    let query = handle.or_else(|| extract_legacy_name(url))?;
    match directory.search_channel_id(&query).await {
        Ok(Some(id)) => Some(ResolvedChannel {
            channel_id: id,
            resolved_by: ResolvedBy::Search,
        }),
        Ok(None) => {
            debug!(%url, %query, "Channel search found nothing");
            None
        }
        Err(e) => {
            warn!(%url, %query, error = %e, "Channel search failed");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::upstream::ChannelRecord;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory directory that records every lookup.
    #[derive(Default)]
    pub(crate) struct FakeDirectory {
        pub handles: HashMap<String, String>,
        pub searches: HashMap<String, String>,
        pub records: HashMap<String, ChannelRecord>,
        pub failing_handles: bool,
        pub calls: RefCell<Vec<String>>,
    }

    impl ChannelDirectory for FakeDirectory {
        async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, FeedError> {
            self.calls.borrow_mut().push(format!("handle:{handle}"));
            if self.failing_handles {
                return Err(FeedError::HttpStatus {
                    endpoint: "channels".to_string(),
                    status: 403,
                });
            }
            Ok(self.handles.get(handle).cloned())
        }

        async fn search_channel_id(&self, query: &str) -> Result<Option<String>, FeedError> {
            self.calls.borrow_mut().push(format!("search:{query}"));
            Ok(self.searches.get(query).cloned())
        }

        async fn fetch_channels(
            &self,
            channel_ids: &[String],
        ) -> Result<Vec<ChannelRecord>, FeedError> {
            self.calls
                .borrow_mut()
                .push(format!("fetch:{}", channel_ids.join(",")));
            Ok(channel_ids
                .iter()
                .filter_map(|id| self.records.get(id).cloned())
                .collect())
        }
    }

    #[test]
    fn test_extract_channel_id() {
        assert_eq!(
            extract_channel_id("https://www.youtube.com/channel/UCx_y-z123/videos"),
            Some("UCx_y-z123".to_string())
        );
        assert_eq!(extract_channel_id("https://www.youtube.com/channel/abc"), None);
        assert_eq!(extract_channel_id("https://www.youtube.com/@name"), None);
    }

    #[test]
    fn test_extract_handle() {
        assert_eq!(
            extract_handle("https://www.youtube.com/@HEYNEE103/shorts"),
            Some("HEYNEE103".to_string())
        );
        assert_eq!(extract_handle("@virbro_"), Some("virbro_".to_string()));
        assert_eq!(
            extract_handle("https://www.youtube.com/@name?si=abc"),
            Some("name".to_string())
        );
        assert_eq!(extract_handle("https://www.youtube.com/channel/UCabc"), None);
        assert_eq!(extract_handle("someone@example.com"), None);
    }

    #[tokio::test]
    async fn test_configured_id_wins_without_lookups() {
        let directory = FakeDirectory::default();
        let resolved = resolve_channel_id(&directory, "https://www.youtube.com/@x", Some(" UCcfg "))
            .await
            .unwrap();
        assert_eq!(resolved.channel_id, "UCcfg");
        assert_eq!(resolved.resolved_by, ResolvedBy::Config);
        assert!(directory.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_url_path_before_handle() {
        let directory = FakeDirectory::default();
        let resolved =
            resolve_channel_id(&directory, "https://www.youtube.com/channel/UCpath", None)
                .await
                .unwrap();
        assert_eq!(resolved.resolved_by, ResolvedBy::UrlPath);
        assert!(directory.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_handle_then_search_fallback() {
        let mut directory = FakeDirectory::default();
        directory
            .searches
            .insert("korean".to_string(), "UCsearch".to_string());
        let resolved = resolve_channel_id(&directory, "https://www.youtube.com/@korean", None)
            .await
            .unwrap();
        assert_eq!(resolved.channel_id, "UCsearch");
        assert_eq!(resolved.resolved_by, ResolvedBy::Search);
        assert_eq!(
            *directory.calls.borrow(),
            vec!["handle:korean".to_string(), "search:korean".to_string()]
        );
    }

    #[tokio::test]
    async fn test_handle_error_falls_through_to_search() {
        let mut directory = FakeDirectory {
            failing_handles: true,
            ..Default::default()
        };
        directory.searches.insert("x".to_string(), "UCx".to_string());
        let resolved = resolve_channel_id(&directory, "@x", None).await.unwrap();
        assert_eq!(resolved.resolved_by, ResolvedBy::Search);
    }

    #[tokio::test]
    async fn test_legacy_name_is_searched() {
        let mut directory = FakeDirectory::default();
        directory
            .searches
            .insert("oldname".to_string(), "UCold".to_string());
        let resolved = resolve_channel_id(&directory, "https://www.youtube.com/user/oldname", None)
            .await
            .unwrap();
        assert_eq!(resolved.channel_id, "UCold");
    }

    #[tokio::test]
    async fn test_unresolvable_returns_none() {
        let directory = FakeDirectory::default();
        assert!(
            resolve_channel_id(&directory, "https://www.youtube.com/@ghost", None)
                .await
                .is_none()
        );
        assert!(
            resolve_channel_id(&directory, "https://example.com/nothing", None)
                .await
                .is_none()
        );
    }
}
