//! Immutable stat snapshots.
//!
//! A [`StatSnapshot`] captures one filesystem entry's metadata at a
//! single point in time. All type booleans are materialized when the
//! snapshot is taken so the value stays correct after it crosses a
//! process boundary or the underlying entry changes.

use crate::error::{FsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Transport-safe record of a filesystem entry's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSnapshot {
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Final path component.
    pub base_name: String,
    /// Extension without the leading dot, if any.
    pub extension: Option<String>,
    pub is_directory: bool,
    pub is_file: bool,
    pub is_symbolic_link: bool,
    /// Size in bytes.
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub readonly: bool,
}

impl StatSnapshot {
    /// Build a snapshot from an already-resolved metadata value.
    ///
    /// Used by the listing and translation layers so the booleanization
    /// happens in exactly one place.
    pub fn from_metadata(path: &Path, meta: &Metadata) -> Self {
        let file_type = meta.file_type();
        Self {
            path: path.to_path_buf(),
            base_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            extension: path.extension().map(|e| e.to_string_lossy().into_owned()),
            is_directory: file_type.is_dir(),
            is_file: file_type.is_file(),
            is_symbolic_link: file_type.is_symlink(),
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            created: meta.created().ok().map(DateTime::<Utc>::from),
            readonly: meta.permissions().readonly(),
        }
    }
}

/// Take a snapshot of the entry at `path`.
///
/// The no-follow form is attempted first so a symlink reports as a
/// symlink rather than its target; on failure the follow form is tried
/// so the entry can still resolve through a usable target. Fails only
/// when both forms fail.
pub async fn snapshot(path: impl AsRef<Path>) -> Result<StatSnapshot> {
    let path = path.as_ref();
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => Ok(StatSnapshot::from_metadata(path, &meta)),
        Err(first) => {
            warn!(path = %path.display(), error = %first, "lstat failed, falling back to stat");
            match tokio::fs::metadata(path).await {
                Ok(meta) => Ok(StatSnapshot::from_metadata(path, &meta)),
                Err(source) => Err(FsError::Stat { path: path.to_path_buf(), source }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn snapshots_a_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.txt");
        std::fs::write(&file, b"hello").unwrap();

        let snap = snapshot(&file).await.unwrap();
        assert_eq!(snap.path, file);
        assert_eq!(snap.base_name, "report.txt");
        assert_eq!(snap.extension.as_deref(), Some("txt"));
        assert!(snap.is_file);
        assert!(!snap.is_directory);
        assert!(!snap.is_symbolic_link);
        assert_eq!(snap.size, 5);
        assert!(snap.modified.is_some());
    }

    #[tokio::test]
    async fn snapshots_a_directory() {
        let dir = TempDir::new().unwrap();
        let snap = snapshot(dir.path()).await.unwrap();
        assert!(snap.is_directory);
        assert!(!snap.is_file);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_reports_as_symlink_not_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        std::fs::write(&target, b"x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let snap = snapshot(&link).await.unwrap();
        assert!(snap.is_symbolic_link);
        assert!(!snap.is_file);
    }

    #[tokio::test]
    async fn fails_when_both_stat_forms_fail() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = snapshot(&missing).await.unwrap_err();
        assert!(matches!(err, FsError::Stat { .. }));
    }

    #[tokio::test]
    async fn booleans_survive_filesystem_changes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gone.txt");
        std::fs::write(&file, b"x").unwrap();

        let snap = snapshot(&file).await.unwrap();
        std::fs::remove_file(&file).unwrap();

        // Snapshot is detached from the live entry.
        assert!(snap.is_file);
        assert_eq!(snap.size, 1);
    }
}
