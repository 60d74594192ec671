//! Raw file operations with scoped handle management.

use crate::error::Result;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Copy `src` to `dst` as a byte stream, returning the bytes copied.
///
/// Both handles are scoped to this call and released on every exit
/// path, including mid-copy errors.
pub async fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<u64> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    let mut reader = File::open(src).await?;
    let mut writer = File::create(dst).await?;
    let copied = tokio::io::copy(&mut reader, &mut writer).await?;
    writer.flush().await?;

    debug!(src = %src.display(), dst = %dst.display(), bytes = copied, "copied file");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn copies_all_bytes() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        let content = vec![7u8; 64 * 1024];
        std::fs::write(&src, &content).unwrap();

        let copied = copy_file(&src, &dst).await.unwrap();
        assert_eq!(copied, content.len() as u64);
        assert_eq!(std::fs::read(&dst).unwrap(), content);
    }

    #[tokio::test]
    async fn missing_source_fails_without_creating_destination() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("dst.bin");
        assert!(copy_file(dir.path().join("absent"), &dst).await.is_err());
        assert!(!dst.exists());
    }
}
