//! Archive download.
//!
//! Streams a release asset to disk chunk by chunk, so memory use stays flat
//! no matter how large the archive is. The destination file is created (or
//! truncated) up front and removed again if the transfer breaks half way.

use crate::config::UpdaterConfig;
use crate::core::{Result, UpdaterError};
use crate::utils::http;
use crate::utils::progress::ProgressBar;
use reqwest::Client;
use reqwest::header::ACCEPT;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// A fully written archive on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArchive {
    /// Location of the archive (`destination_dir/name`).
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: u64,
}

/// Downloads release archives over HTTP.
pub struct Downloader {
    client: Client,
    show_progress: bool,
}

impl Downloader {
    /// Create a downloader using the timeouts from `config`.
    ///
    /// `timeout_secs` limits how long the body may stall, not the whole
    /// transfer.
    pub fn new(config: &UpdaterConfig, show_progress: bool) -> Result<Self> {
        Ok(Self {
            client: http::build_download_client(config)?,
            show_progress,
        })
    }

    /// Download `url` into `destination_dir/name`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::Download`] when the request fails, the server answers
    ///   with a non-2xx status or the body stream breaks
    /// - [`UpdaterError::Filesystem`] when the file cannot be created or written
    ///
    /// On any failure after the file was created, the partial file is removed.
    pub async fn download(&self, name: &str, url: &str, destination_dir: &Path) -> Result<DownloadedArchive> {
        info!("Downloading {name}...");
        let path = destination_dir.join(name);

        debug!("GET Request {url}");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .map_err(|e| download_error(url, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(url, format!("HTTP {status}")));
        }

        debug!("Create file {}", path.display());
        let file = File::create(&path)
            .await
            .map_err(|e| UpdaterError::filesystem("create", &path, e))?;

        info!("Writing file...");
        let progress = ProgressBar::download(response.content_length(), !self.show_progress);
        progress.set_prefix(name);

        // Removes the file on error, and also when this future is dropped mid-transfer.
        let partial = PartialFile::new(&path);
        match stream_to_file(response, file, &path, url, &progress).await {
            Ok(bytes) => {
                partial.keep();
                progress.finish_and_clear();
                info!("Download successful !");
                Ok(DownloadedArchive {
                    path,
                    bytes,
                })
            }
            Err(e) => {
                progress.abandon();
                Err(e)
            }
        }
    }
}

async fn stream_to_file(
    mut response: reqwest::Response,
    mut file: File,
    path: &Path,
    url: &str,
    progress: &ProgressBar,
) -> Result<u64> {
    let mut written = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| download_error(url, format!("transfer interrupted: {e}")))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| UpdaterError::filesystem("write", path, e))?;
        written += chunk.len() as u64;
        progress.inc(chunk.len() as u64);
    }

    file.flush().await.map_err(|e| UpdaterError::filesystem("flush", path, e))?;
    debug!("Wrote {written} bytes to {}", path.display());
    Ok(written)
}

/// A download target that is deleted on drop unless kept.
struct PartialFile<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> PartialFile<'a> {
    const fn new(path: &'a Path) -> Self {
        Self {
            path,
            armed: true,
        }
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(self.path) {
            Ok(()) => debug!("Removed partial download {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove partial download {}: {e}", self.path.display()),
        }
    }
}

fn download_error(url: &str, reason: impl Into<String>) -> UpdaterError {
    UpdaterError::Download {
        url: url.to_string(),
        reason: reason.into(),
    }
}
