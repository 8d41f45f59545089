use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::domain::images::GeneratedImage;

/// Suffixes drawn before giving up on finding a free filename.
const MAX_NAME_ATTEMPTS: usize = 8;
const SUFFIX_RANGE: u32 = 1_000_000_000;

/// Append-only store for generated thumbnails, served under `/uploads`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    base_url: String,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/uploads/{filename}", self.base_url)
    }

    pub async fn save(&self, bytes: &[u8]) -> io::Result<GeneratedImage> {
        let timestamp = Utc::now().timestamp_millis();
        let suffixes = std::iter::repeat_with(|| rand::random::<u32>() % SUFFIX_RANGE);
        self.save_with_suffixes(bytes, timestamp, suffixes).await
    }

    async fn save_with_suffixes(
        &self,
        bytes: &[u8],
        timestamp_ms: i64,
        suffixes: impl Iterator<Item = u32>,
    ) -> io::Result<GeneratedImage> {
        tokio::fs::create_dir_all(&self.dir).await?;

        for suffix in suffixes.take(MAX_NAME_ATTEMPTS) {
            let filename = thumbnail_filename(timestamp_ms, suffix);
            let path = self.dir.join(&filename);

            let file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(filename = %filename, "thumbnail filename taken, drawing another");
                    continue;
                }
                Err(err) => return Err(err),
            };

            write_or_remove(&path, file, bytes).await?;

            return Ok(GeneratedImage {
                bytes: bytes.to_vec(),
                url: self.public_url(&filename),
                filename,
                path,
            });
        }

        Err(io::Error::new(
            ErrorKind::AlreadyExists,
            "no free thumbnail filename available",
        ))
    }
}

/// Writes `bytes` through `writer`; on failure the file at `path` is
/// removed so a truncated thumbnail is never served.
async fn write_or_remove<W>(path: &Path, mut writer: W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;
    drop(writer);

    if let Err(err) = written {
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "failed to remove partial thumbnail");
        }
        return Err(err);
    }
    Ok(())
}

pub fn thumbnail_filename(timestamp_ms: i64, suffix: u32) -> String {
    format!("thumbnail-{timestamp_ms}-{suffix}.png")
}
