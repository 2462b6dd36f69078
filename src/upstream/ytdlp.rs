//! yt-dlp backed listing and detail resolution.
//!
//! Listing runs `yt-dlp --flat-playlist --skip-download -j --playlist-end N`
//! against the channel's shorts tab and reads one JSON object per stdout
//! line. Detail runs `yt-dlp -j --skip-download --no-playlist` against a
//! single video and reads the last JSON object printed.
//!
//! Lines that are not JSON objects (progress output, warnings) are skipped.
//! A non-zero exit fails the invocation with the captured stderr.

use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::YtDlpConfig;
use crate::error::FeedError;
use crate::models::{RawCandidate, RawDuration, RawTimestamp, Source, VideoDetail};
use crate::upstream::UpstreamSource;
use crate::utils::truncate_for_log;

/// The subset of a yt-dlp info dict this crate reads.
///
/// Flat-playlist entries fill only some of these; full `-j` output fills
/// most of them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YtDlpEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub duration: Option<RawDuration>,
    pub timestamp: Option<f64>,
    pub release_timestamp: Option<f64>,
    pub upload_date: Option<String>,
    pub view_count: Option<u64>,
}

impl YtDlpEntry {
    fn published(&self) -> Option<RawTimestamp> {
        self.timestamp
            .or(self.release_timestamp)
            .map(RawTimestamp::Epoch)
            .or_else(|| self.upload_date.clone().map(RawTimestamp::Text))
    }

    fn uploader(&self) -> Option<String> {
        self.uploader
            .clone()
            .or_else(|| self.channel.clone())
            .filter(|name| !name.is_empty())
    }

    fn into_candidate(self) -> RawCandidate {
        RawCandidate {
            video_id: self.id.clone().filter(|id| !id.is_empty()),
            title: self.title.clone(),
            uploader: self.uploader(),
            duration: self.duration.clone(),
            published: self.published(),
            view_count: self.view_count,
        }
    }

    fn into_detail(self) -> Option<VideoDetail> {
        let video_id = self.id.clone().filter(|id| !id.is_empty())?;
        Some(VideoDetail {
            video_id,
            title: self.title.clone(),
            uploader: self.uploader(),
            duration: self.duration.clone(),
            published: self.published(),
            view_count: self.view_count,
        })
    }
}

/// Parse JSON-Lines output, silently dropping lines that do not parse.
pub fn parse_json_lines(stdout: &str) -> Vec<YtDlpEntry> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<YtDlpEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, line = %truncate_for_log(line, 120), "Skipping non-JSON line");
                None
            }
        })
        .collect()
}

/// Point a channel URL at its shorts tab.
///
/// Bare `@handle`s become full URLs. URLs that already name a listing tab
/// (`/shorts`, `/videos`, `/streams`) or that are not channel URLs are
/// returned unchanged. Any other tab (`/featured`, `/about`, ...) is replaced
/// by `/shorts`. Query strings and fragments are preserved.
pub fn shorts_tab_url(channel: &str) -> String {
    let channel = channel.trim();
    let absolute = if channel.starts_with('@') {
        format!("https://www.youtube.com/{channel}")
    } else {
        channel.to_string()
    };

    let Ok(mut url) = Url::parse(&absolute) else {
        return channel.to_string();
    };
    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();

    // Segments naming the channel itself; anything after them is a tab.
    let base_len = match segments.first().map(String::as_str) {
        Some(first) if first.starts_with('@') => 1,
        Some("channel" | "c" | "user") if segments.len() >= 2 => 2,
        _ => return absolute,
    };
    let tab = segments.get(base_len).map(String::as_str);
    if matches!(tab, Some("shorts" | "videos" | "streams")) {
        return absolute;
    }

    url.set_path(&format!("/{}/shorts", segments[..base_len].join("/")));
    url.to_string()
}

/// Canonical watch URL handed to yt-dlp for detail lookups.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// yt-dlp subprocess backend.
#[derive(Debug, Clone, Default)]
pub struct YtDlp {
    config: YtDlpConfig,
}

impl YtDlp {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    fn program(&self) -> String {
        self.config.program.display().to_string()
    }

    /// Run yt-dlp with `args` followed by `target` and return its stdout.
    #[instrument(level = "debug", skip(self, args))]
    async fn run(&self, args: &[&str], target: &str) -> Result<String, FeedError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(args)
            .arg(target)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match timeout(self.config.timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FeedError::ToolTimedOut {
                    program: self.program(),
                    target: target.to_string(),
                    secs: self.config.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            return Err(FeedError::ToolFailed {
                program: self.program(),
                target: target.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl UpstreamSource for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    #[instrument(level = "info", skip_all, fields(source = %source.url))]
    async fn list_candidates(
        &self,
        source: &Source,
        limit: usize,
    ) -> Result<Vec<RawCandidate>, FeedError> {
        let list_url = shorts_tab_url(&source.url);
        let playlist_end = limit.max(1).to_string();
        let stdout = self
            .run(
                &[
                    "--flat-playlist",
                    "--skip-download",
                    "-j",
                    "--playlist-end",
                    &playlist_end,
                ],
                &list_url,
            )
            .await?;

        let candidates: Vec<RawCandidate> = parse_json_lines(&stdout)
            .into_iter()
            .take(limit.max(1))
            .map(YtDlpEntry::into_candidate)
            .collect();
        info!(%list_url, count = candidates.len(), "Listed recent uploads");
        Ok(candidates)
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_detail(&self, video_id: &str) -> Result<Option<VideoDetail>, FeedError> {
        let url = watch_url(video_id);
        let stdout = self
            .run(&["-j", "--skip-download", "--no-playlist"], &url)
            .await?;
        let entry = parse_json_lines(&stdout)
            .pop()
            .ok_or_else(|| FeedError::ToolNoOutput {
                program: self.program(),
                target: url.clone(),
            })?;
        Ok(entry.into_detail())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    const STUB: &str = r#"#!/usr/bin/env bash
set -eu
echo "$@" >> "$(dirname "$0")/calls.log"
mode=detail
target=""
for arg in "$@"; do
  if [ "$arg" = "--flat-playlist" ]; then
    mode=list
  fi
  target="$arg"
done
case "$target" in
  *slow*) sleep 5 ;;
esac
if [ "$mode" = list ]; then
  case "$target" in
    *broken*) echo "ERROR: This channel does not exist." >&2; exit 1 ;;
  esac
  echo '{"id": "short1", "title": "첫 쇼츠", "channel": "Chan", "duration": 45}'
  echo 'WARNING: not json'
  echo '{"id": "long1", "title": "Long", "uploader": "Chan", "duration": 90, "timestamp": 1770000000}'
  echo '{"title": "missing id"}'
  exit 0
fi
case "$target" in
  *short1)
    echo '[youtube] short1: Downloading webpage'
    echo '{"id": "short1", "title": "첫 쇼츠", "uploader": "Chan", "duration": 45, "timestamp": 1770000000, "view_count": 28340}'
    ;;
  *long1)
    echo '{"id": "long1", "duration": 90.5, "upload_date": "20260201", "view_count": null}'
    ;;
  *empty*)
    echo 'nothing useful'
    ;;
  *)
    echo "ERROR: Video unavailable" >&2
    exit 1
    ;;
esac
"#;

    fn install_stub(dir: &Path) -> PathBuf {
        let path = dir.join("yt-dlp");
        std::fs::write(&path, STUB).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn stub_backend(dir: &Path) -> YtDlp {
        YtDlp::new(YtDlpConfig {
            program: install_stub(dir),
            timeout: Duration::from_secs(10),
        })
    }

    #[test]
    fn test_shorts_tab_url() {
        assert_eq!(
            shorts_tab_url("https://www.youtube.com/@virbro_"),
            "https://www.youtube.com/@virbro_/shorts"
        );
        assert_eq!(
            shorts_tab_url("https://www.youtube.com/@virbro_/shorts"),
            "https://www.youtube.com/@virbro_/shorts"
        );
        assert_eq!(
            shorts_tab_url("https://www.youtube.com/channel/UCabc/?si=x"),
            "https://www.youtube.com/channel/UCabc/shorts?si=x"
        );
        assert_eq!(shorts_tab_url("@name"), "https://www.youtube.com/@name/shorts");
        assert_eq!(
            shorts_tab_url("https://www.youtube.com/@x/featured"),
            "https://www.youtube.com/@x/shorts"
        );
        assert_eq!(
            shorts_tab_url("https://www.youtube.com/channel/UCabc/playlists/"),
            "https://www.youtube.com/channel/UCabc/shorts"
        );
        assert_eq!(
            shorts_tab_url("https://www.youtube.com/c/Name/about?si=x"),
            "https://www.youtube.com/c/Name/shorts?si=x"
        );
        assert_eq!(shorts_tab_url("@name/live"), "https://www.youtube.com/@name/shorts");
        assert_eq!(
            shorts_tab_url("https://www.youtube.com/c/live"),
            "https://www.youtube.com/c/live/shorts"
        );
        assert_eq!(
            shorts_tab_url("https://www.youtube.com/playlist?list=PL1"),
            "https://www.youtube.com/playlist?list=PL1"
        );
    }

    #[test]
    fn test_parse_json_lines_skips_garbage() {
        let stdout = "{\"id\": \"a\"}\n\nnot json\n{\"id\": \"b\", \"duration\": 12}\n{broken\n";
        let entries = parse_json_lines(stdout);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].duration, Some(RawDuration::Seconds(12.0)));
    }

    #[test]
    fn test_entry_prefers_timestamp_over_upload_date() {
        let entry: YtDlpEntry = serde_json::from_str(
            r#"{"id": "x", "timestamp": 1770000000, "upload_date": "20260201", "channel": "C"}"#,
        )
        .unwrap();
        let candidate = entry.into_candidate();
        assert_eq!(candidate.published, Some(RawTimestamp::Epoch(1_770_000_000.0)));
        assert_eq!(candidate.uploader.as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn test_list_candidates_reads_json_lines() {
        let dir = TempDir::new().unwrap();
        let backend = stub_backend(dir.path());

        let source = Source::from_url("https://www.youtube.com/@chan");
        let candidates = backend.list_candidates(&source, 15).await.unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].video_id.as_deref(), Some("short1"));
        assert_eq!(candidates[0].uploader.as_deref(), Some("Chan"));
        assert_eq!(candidates[2].video_id, None);

        let calls = std::fs::read_to_string(dir.path().join("calls.log")).unwrap();
        assert!(calls.contains("--flat-playlist --skip-download -j --playlist-end 15"));
        assert!(calls.contains("https://www.youtube.com/@chan/shorts"));
    }

    #[tokio::test]
    async fn test_list_candidates_respects_limit() {
        let dir = TempDir::new().unwrap();
        let backend = stub_backend(dir.path());
        let candidates = backend
            .list_candidates(&Source::from_url("@chan"), 1)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_list_failure_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let backend = stub_backend(dir.path());
        let err = backend
            .list_candidates(&Source::from_url("https://www.youtube.com/@broken"), 15)
            .await
            .unwrap_err();
        match err {
            FeedError::ToolFailed { stderr, .. } => assert!(stderr.contains("does not exist")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_detail_uses_last_json_object() {
        let dir = TempDir::new().unwrap();
        let backend = stub_backend(dir.path());

        let detail = backend.fetch_detail("short1").await.unwrap().unwrap();
        assert_eq!(detail.video_id, "short1");
        assert_eq!(detail.view_count, Some(28340));
        assert_eq!(detail.duration, Some(RawDuration::Seconds(45.0)));

        let long = backend.fetch_detail("long1").await.unwrap().unwrap();
        assert_eq!(long.published, Some(RawTimestamp::Text("20260201".to_string())));
        assert_eq!(long.view_count, None);
    }

    #[tokio::test]
    async fn test_fetch_detail_without_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let backend = stub_backend(dir.path());
        let err = backend.fetch_detail("empty").await.unwrap_err();
        assert!(matches!(err, FeedError::ToolNoOutput { .. }));
    }

    #[tokio::test]
    async fn test_fetch_details_skips_failed_items() {
        let dir = TempDir::new().unwrap();
        let backend = stub_backend(dir.path());
        let ids = vec!["short1".to_string(), "gone".to_string(), "long1".to_string()];
        let details = backend.fetch_details(&ids).await;
        let ids: Vec<&str> = details.iter().map(|d| d.video_id.as_str()).collect();
        assert_eq!(ids, vec!["short1", "long1"]);
    }

    #[tokio::test]
    async fn test_invocation_times_out() {
        let dir = TempDir::new().unwrap();
        let backend = YtDlp::new(YtDlpConfig {
            program: install_stub(dir.path()),
            timeout: Duration::from_millis(200),
        });
        let err = backend.fetch_detail("slow").await.unwrap_err();
        assert!(matches!(err, FeedError::ToolTimedOut { .. }));
    }
}
