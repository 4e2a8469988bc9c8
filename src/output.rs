use crate::error::{GenerationError, Result};
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

const MAX_STEM_LEN: usize = 64;
const MAX_NAME_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub dir: PathBuf,
}

impl OutputSettings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Create the output directory if it is missing.
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).await.map_err(|e| {
        GenerationError::Storage(format!("cannot create {}: {}", dir.display(), e))
    })
}

/// Write one generated image under a fresh name and return its path.
///
/// Files are opened create-new, so a name taken by another session is
/// never overwritten; a new suffix is drawn instead.
pub async fn save_image(
    settings: &OutputSettings,
    stem: Option<&str>,
    mime_type: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    ensure_dir(&settings.dir).await?;

    let stem = stem
        .map(sanitize_stem)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "generated".to_string());
    let extension = extension_for(mime_type);

    for _ in 0..MAX_NAME_ATTEMPTS {
        let path = settings.dir.join(unique_file_name(&stem, extension));
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;

        let file = match file {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                log::debug!("{} already exists, drawing a new name", path.display());
                continue;
            }
            Err(e) => {
                return Err(GenerationError::Storage(format!(
                    "cannot create {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        write_or_discard(file, &path, bytes).await?;

        log::info!("💾 Image saved to: {}", path.display());
        return Ok(path);
    }

    Err(GenerationError::Storage(format!(
        "could not find a free file name in {}",
        settings.dir.display()
    )))
}

/// Fill a freshly created file. A failed write removes the file so no
/// truncated image is left behind.
async fn write_or_discard<W>(mut file: W, path: &Path, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    drop(file);

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(path).await {
            log::warn!(
                "⚠️  Could not remove partial file {}: {}",
                path.display(),
                cleanup
            );
        }
        return Err(GenerationError::Storage(format!("{}: {}", path.display(), e)));
    }
    Ok(())
}

fn unique_file_name(stem: &str, extension: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.{}", stem, timestamp, &suffix[..8], extension)
}

/// Turn user text into something safe for a file name.
///
/// Whitespace runs become a single underscore; anything other than
/// alphanumerics, `-` and `_` is dropped.
pub fn sanitize_stem(raw: &str) -> String {
    let mut out = String::new();
    let mut pending_sep = false;

    for c in raw.trim().chars() {
        if c.is_whitespace() {
            pending_sep = !out.is_empty();
        } else if c.is_alphanumeric() || c == '-' || c == '_' {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.push(c);
        }
    }

    out.chars().take(MAX_STEM_LEN).collect()
}

pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Writer that behaves like a full disk.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(
                io::ErrorKind::Other,
                "no space left on device",
            )))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("red fox"), "red_fox");
        assert_eq!(sanitize_stem("  oil   painting "), "oil_painting");
        assert_eq!(sanitize_stem("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_stem("fox_watercolor"), "fox_watercolor");
        assert_eq!(sanitize_stem("!!!"), "");
        assert_eq!(sanitize_stem(&"a".repeat(100)).len(), MAX_STEM_LEN);
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("application/octet-stream"), "png");
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");
        ensure_dir(&dir).await.unwrap();
        ensure_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_save_image_writes_exact_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = OutputSettings::new(tmp.path().join("images"));
        let bytes = vec![0x89, b'P', b'N', b'G', 1, 2, 3];

        let path = save_image(&settings, Some("red fox_watercolor"), "image/png", &bytes)
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("red_fox_watercolor_"));
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_concurrent_saves_never_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = OutputSettings::new(tmp.path());

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let settings = settings.clone();
            handles.push(tokio::spawn(async move {
                save_image(&settings, None, "image/png", &[i]).await.unwrap()
            }));
        }

        let mut paths = Vec::new();
        for handle in handles {
            paths.push(handle.await.unwrap());
        }
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 16);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 16);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("generated_partial.png");
        std::fs::write(&path, b"").unwrap();

        let err = write_or_discard(FullDisk, &path, &[1, 2, 3])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "storage_error");
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
