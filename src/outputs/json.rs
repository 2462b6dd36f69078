//! JSON snapshot output for the static site.
//!
//! Documents are pretty-printed with two-space indentation and written as
//! UTF-8 with non-ASCII text kept verbatim (Korean titles stay readable).
//!
//! # Replace Semantics
//!
//! The serialized document is first written to a hidden sibling file
//! (`.shorts.json.tmp`) and then renamed over the target. A run that fails
//! part-way leaves the previous snapshot untouched.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::FeedError;

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.json".to_string());
    path.with_file_name(format!(".{file_name}.tmp"))
}

/// Serialize a document the way it is written to disk.
pub fn to_pretty_json<T: Serialize>(document: &T) -> Result<String, FeedError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Write `document` to `path`, replacing any previous file atomically.
///
/// Creates the parent directory when it does not exist.
///
/// # Errors
///
/// Returns an error if serialization, directory creation, the temp write, or
/// the final rename fails. On rename failure the temp file is removed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_document<T: Serialize>(document: &T, path: &Path) -> Result<(), FeedError> {
    let json = to_pretty_json(document)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, json.as_bytes()).await?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        error!(tmp = %tmp_path.display(), error = %e, "Failed to move snapshot into place");
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    info!(bytes = json.len(), "Wrote JSON snapshot");
    Ok(())
}
