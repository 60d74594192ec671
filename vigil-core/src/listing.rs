//! Directory listings with concurrently resolved metadata.

use crate::error::{FsError, Result};
use crate::paths;
use crate::stat::{self, StatSnapshot};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Result of listing one directory.
///
/// Entry order follows the underlying directory enumeration order and
/// is not guaranteed sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    /// Resolved absolute path of the listed directory.
    pub path: PathBuf,
    pub entries: Vec<StatSnapshot>,
}

/// List the entries of `path` with resolved metadata.
///
/// The path is resolved through [`paths::resolve_home`] first. Per-entry
/// snapshots are taken concurrently; an entry whose stat fails is logged
/// and dropped so one bad entry (permissions, deletion race) never fails
/// the whole listing. Only a failure of the top-level enumeration itself
/// surfaces as [`FsError::DirectoryRead`].
pub async fn list(path: impl AsRef<Path>) -> Result<DirectoryListing> {
    let root = paths::resolve_home(path.as_ref());

    let mut reader = tokio::fs::read_dir(&root)
        .await
        .map_err(|source| FsError::DirectoryRead { path: root.clone(), source })?;

    let mut names = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|source| FsError::DirectoryRead { path: root.clone(), source })?
    {
        names.push(entry.path());
    }

    let resolved = join_all(names.iter().map(stat::snapshot)).await;

    let mut entries = Vec::with_capacity(names.len());
    for (name, result) in names.iter().zip(resolved) {
        match result {
            Ok(snap) => entries.push(snap),
            Err(e) => warn!(entry = %name.display(), error = %e, "dropping unresolvable listing entry"),
        }
    }

    debug!(path = %root.display(), count = entries.len(), "listed directory");
    Ok(DirectoryListing { path: root, entries })
}

/// List `path` while also waiting out a fixed minimum duration.
///
/// Fast listings resolve only once `min` has elapsed (so callers driving
/// an animation don't flicker); slow listings are never delayed further.
/// The timer is purely presentational and does not affect the listing's
/// own failure handling.
pub async fn list_with_min_delay(
    path: impl AsRef<Path>,
    min: Duration,
) -> Result<DirectoryListing> {
    let (result, _) = tokio::join!(list(path), tokio::time::sleep(min));
    result
}
