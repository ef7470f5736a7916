//! Downloads one archive version to its timestamped path.
//!
//! The body is streamed chunk by chunk to disk. Any failure after the file is
//! created removes it again, so a later scan never mistakes a truncated
//! archive for a complete one.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{fs::File, io::AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::DownloadError;
use crate::reconcile::DownloadTask;

/// Upper bound on attempts for one archive.
pub const MAX_ATTEMPTS: u32 = 5;

const DOWNLOAD_TEMPLATE: &str = "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Bounded, fixed-delay retry for timeouts and refused connections.
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(3, Duration::from_secs(5))
    }
}

/// Fetches archives with a shared client.
pub struct Downloader {
    client: reqwest::Client,
    retry: RetryPolicy,
    stall_timeout: Duration,
    cancel: CancellationToken,
}

impl Downloader {
    pub fn new(
        client: reqwest::Client,
        retry: RetryPolicy,
        stall_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Downloader {
            client,
            retry,
            stall_timeout,
            cancel,
        }
    }

    /// Downloads `task` and returns the path of the complete archive.
    pub async fn fetch(
        &self,
        task: &DownloadTask,
        progress: &ProgressBar,
    ) -> Result<PathBuf, DownloadError> {
        tokio::fs::create_dir_all(&task.destination_dir)
            .await
            .map_err(|source| DownloadError::Io {
                path: task.destination_dir.clone(),
                source,
            })?;

        let path = task.destination_path();
        let mut attempt = 1;

        loop {
            info!(url = %task.source_url, attempt, "Download starting");

            let error = match self.fetch_once(task, &path, progress).await {
                Ok(bytes) => {
                    info!(url = %task.source_url, bytes, path = %path.display(), "Download complete");
                    return Ok(path);
                }
                Err(e) => e,
            };

            remove_partial(&path).await;

            if !error.is_retryable() || attempt >= self.retry.max_attempts {
                return Err(error);
            }

            warn!(
                url = %task.source_url,
                attempt,
                max_attempts = self.retry.max_attempts,
                error = %error,
                "Download failed, retrying"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(DownloadError::Cancelled { url: task.source_url.clone() });
                }
                _ = tokio::time::sleep(self.retry.delay) => {}
            }

            attempt += 1;
        }
    }

    async fn fetch_once(
        &self,
        task: &DownloadTask,
        path: &Path,
        progress: &ProgressBar,
    ) -> Result<u64, DownloadError> {
        let url = task.source_url.as_str();
        let cancelled = || DownloadError::Cancelled {
            url: url.to_string(),
        };

        let request = tokio::time::timeout(self.stall_timeout, self.client.get(url).send());
        let response = tokio::select! {
            _ = self.cancel.cancelled() => return Err(cancelled()),
            result = request => match result {
                Err(_) => return Err(DownloadError::Timeout { url: url.to_string() }),
                Ok(response) => response.map_err(|e| classify(url, e))?,
            },
        };

        let status = response.status();
        if status.is_client_error() {
            return Err(DownloadError::InvalidUrl {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }
        let response = response
            .error_for_status()
            .map_err(|e| classify(url, e))?;

        let total_size = response.content_length();
        if let Some(total_size) = total_size {
            progress.set_length(total_size);
            if let Ok(style) = ProgressStyle::with_template(DOWNLOAD_TEMPLATE) {
                progress.set_style(style.progress_chars("=> "));
            }
        }
        progress.set_position(0);

        let io_error = |source| DownloadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::create(path).await.map_err(io_error)?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::time::timeout(self.stall_timeout, stream.next());
            let chunk = tokio::select! {
                _ = self.cancel.cancelled() => return Err(cancelled()),
                next = next => match next {
                    Err(_) => return Err(DownloadError::Timeout { url: url.to_string() }),
                    Ok(None) => break,
                    Ok(Some(chunk)) => chunk.map_err(|e| classify(url, e))?,
                },
            };

            file.write_all(&chunk).await.map_err(io_error)?;
            downloaded += chunk.len() as u64;
            progress.set_position(downloaded);
        }

        file.flush().await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;

        if let Some(total_size) = total_size {
            if downloaded != total_size {
                return Err(DownloadError::Unexpected {
                    url: url.to_string(),
                    source: Box::new(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("received {} of {} bytes", downloaded, total_size),
                    )),
                });
            }
        }

        Ok(downloaded)
    }
}

/// Maps a transport error onto the retry taxonomy.
fn classify(url: &str, e: reqwest::Error) -> DownloadError {
    let url = url.to_string();

    if e.is_timeout() {
        DownloadError::Timeout { url }
    } else if e.is_connect() {
        DownloadError::ConnectionRefused { url }
    } else if e.is_builder() {
        DownloadError::InvalidUrl {
            url,
            reason: e.to_string(),
        }
    } else {
        DownloadError::Unexpected {
            url,
            source: Box::new(e),
        }
    }
}

/// Deletes a partially written archive, if any.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial download"),
    }
}

// -- Tests -------------------------------------------------------------------
