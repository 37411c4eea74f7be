use std::path::{Path, PathBuf};

use log::{debug, warn};
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use uuid::Uuid;

use crate::error::ImportError;

/// A remote media file staged into transient local storage.
///
/// The guard owns the file: dropping it removes the file, so tying the guard
/// to the import call's scope guarantees cleanup on success, typed failure
/// and panic alike. `release` is idempotent and safe to call early.
#[derive(Debug)]
pub struct StagedMedia {
    path: PathBuf,
    released: bool,
}

impl StagedMedia {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file now. Calling this twice, or after the file is
    /// already gone, is a no-op.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("released staged media {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove staged media {}: {e}", self.path.display()),
        }
    }
}

impl Drop for StagedMedia {
    fn drop(&mut self) {
        self.release();
    }
}

/// Download remote media to transient local storage, enforcing `max_bytes`.
///
/// A size reported above the cap (via HEAD) fails with
/// [`ImportError::OversizedMedia`] before any download starts. Servers that
/// do not report a size are caught by a running byte count during the
/// streamed download, which removes the partial file on abort.
pub async fn stage_remote_media(
    client: &Client,
    url: &str,
    max_bytes: u64,
    extension: &str,
    staging_dir: Option<&Path>,
) -> Result<StagedMedia, ImportError> {
    if let Some(size) = reported_size(client, url).await {
        if size > max_bytes {
            return Err(ImportError::OversizedMedia {
                size,
                limit: max_bytes,
            });
        }
    }

    let dir = staging_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);
    let path = dir.join(format!("recipe-import-{}.{extension}", Uuid::new_v4()));
    let staged = StagedMedia {
        path,
        released: false,
    };

    let mut response = client.get(url).send().await?.error_for_status()?;

    let mut file = tokio::fs::File::create(staged.path()).await?;
    let mut written: u64 = 0;
    use tokio::io::AsyncWriteExt;
    while let Some(chunk) = response.chunk().await? {
        written += chunk.len() as u64;
        if written > max_bytes {
            // Guard drop removes the partial file.
            return Err(ImportError::OversizedMedia {
                size: written,
                limit: max_bytes,
            });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    debug!(
        "staged {written} bytes from {url} at {}",
        staged.path().display()
    );
    Ok(staged)
}

async fn reported_size(client: &Client, url: &str) -> Option<u64> {
    let response = client.head(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    response
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Guess a staging file extension and MIME type from a media URL.
pub fn media_kind_of(url: &str) -> (&'static str, &'static str) {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        ("jpg", "image/jpeg")
    } else if path.ends_with(".png") {
        ("png", "image/png")
    } else if path.ends_with(".webp") {
        ("webp", "image/webp")
    } else if path.ends_with(".heic") {
        ("heic", "image/heic")
    } else if path.ends_with(".pdf") {
        ("pdf", "application/pdf")
    } else if path.ends_with(".mp3") || path.ends_with(".m4a") {
        ("mp3", "audio/mpeg")
    } else {
        // Platform CDNs serve mp4 without an extension in the path.
        ("mp4", "video/mp4")
    }
}
