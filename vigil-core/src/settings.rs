//! Persisted JSON settings.
//!
//! Reads are deliberately lenient: an unreadable or malformed settings
//! file is treated as absence, not an error, so a corrupted file never
//! takes the consumer down. Writes go through a sibling temp file and a
//! rename, bounded by a hard deadline.

use crate::error::{FsError, Result};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Load settings from `path`.
///
/// Returns `None` when the file is missing, unreadable, or not valid
/// JSON; the condition is logged and never surfaced as an error.
pub async fn load(path: impl AsRef<Path>) -> Option<Value> {
    let path = path.as_ref();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "settings unreadable, treating as absent");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "settings malformed, treating as absent");
            None
        }
    }
}

/// Atomically save `value` to `path` within `timeout`.
///
/// The content is written to a sibling temp file and renamed into
/// place, so readers observe either the old or the complete new
/// content. On deadline expiry the temp artifact is removed and the
/// operation fails with [`FsError::Timeout`]; the caller must treat any
/// partial result as unusable.
pub async fn save_atomic(path: impl AsRef<Path>, value: &Value, timeout: Duration) -> Result<()> {
    let path = path.as_ref();
    let tmp = path.with_extension("tmp");

    let write = async {
        let data = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    };

    match tokio::time::timeout(timeout, write).await {
        Ok(result) => {
            if result.is_ok() {
                debug!(path = %path.display(), "settings saved");
            }
            result
        }
        Err(_) => {
            let _ = tokio::fs::remove_file(&tmp).await;
            Err(FsError::Timeout {
                operation: format!("save settings to {}", path.display()),
                timeout,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn round_trips_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let value = json!({"theme": "dark", "recent": ["/tmp/a"]});

        save_atomic(&path, &value, Duration::from_secs(5)).await.unwrap();
        assert_eq!(load(&path).await, Some(value));
    }

    #[tokio::test]
    async fn missing_file_is_safe_absence() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load(dir.path().join("absent.json")).await, None);
    }

    #[tokio::test]
    async fn malformed_json_is_safe_absence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert_eq!(load(&path).await, None);
    }

    #[tokio::test]
    async fn save_replaces_previous_content_whole() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        save_atomic(&path, &json!({"v": 1}), Duration::from_secs(5)).await.unwrap();
        save_atomic(&path, &json!({"v": 2}), Duration::from_secs(5)).await.unwrap();

        assert_eq!(load(&path).await, Some(json!({"v": 2})));
        assert!(!path.with_extension("tmp").exists());
    }
}
