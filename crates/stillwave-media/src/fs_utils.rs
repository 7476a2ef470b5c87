//! Filesystem helpers for publishing rendered audio.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Move a finished artifact from `src` to `dst`.
///
/// Scratch files are rendered under a temp directory that may sit on a
/// different filesystem than the audio store, so a plain rename can fail
/// with EXDEV. In that case we copy to a sibling temp file next to `dst`
/// and rename into place, so readers never observe a half-written file.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                src = %src.display(),
                dst = %dst.display(),
                "Cross-device rename, falling back to copy"
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// EXDEV is error code 18 on Linux and macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    // Staging file in the destination directory keeps the final rename atomic
    let staging = dst.with_extension("part");

    fs::copy(src, &staging).await.map_err(MediaError::from)?;

    if let Err(e) = fs::rename(&staging, dst).await {
        let _ = fs::remove_file(&staging).await;
        return Err(MediaError::from(e));
    }

    // Source removal is best effort, the artifact is already published
    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(src = %src.display(), error = %e, "Leftover scratch file after move");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_move_within_one_filesystem() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("render.mp3");
        let dst = dir.path().join("final.mp3");

        fs::write(&src, b"audio bytes").await.unwrap();
        move_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"audio bytes");
    }

    #[tokio::test]
    async fn test_move_creates_destination_directory() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("render.mp3");
        let dst = dir.path().join("output").join("final.mp3");

        fs::write(&src, b"audio bytes").await.unwrap();
        move_file(&src, &dst).await.unwrap();

        assert!(dst.exists());
    }

    #[tokio::test]
    async fn test_move_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("render.mp3");
        let dst = dir.path().join("final.mp3");

        fs::write(&src, b"fresh").await.unwrap();
        fs::write(&dst, b"stale").await.unwrap();

        move_file(&src, &dst).await.unwrap();
        assert_eq!(fs::read(&dst).await.unwrap(), b"fresh");
    }

    #[test]
    fn test_exdev_detection() {
        assert!(is_cross_device_error(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device_error(&std::io::Error::from_raw_os_error(2)));
    }
}
