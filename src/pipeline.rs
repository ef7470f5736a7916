//! Sequences listing, reconciliation, download, merge, verification and export.
//!
//! Archives are processed one at a time. A failure in one archive is logged
//! and recorded in the run summary; the next archive is still attempted.

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::cli::{create_progress_bar, create_spinner};
use crate::config::Config;
use crate::download::Downloader;
use crate::error::{ArchiveError, DownloadError, ExportError, MergeError, PipelineError, Stage};
use crate::extract::{self, extract_and_merge};
use crate::export;
use crate::index::{self, ArchiveRecord, DiffKey};
use crate::layout::YearOutputs;
use crate::reconcile::{filter_years, reconcile, DownloadTask};
use crate::verify::verify;

#[derive(Debug, Default)]
/// Outcome of one synchronization run.
pub struct RunSummary {
    pub planned: usize,
    pub downloaded: usize,
    pub merged: usize,
    pub rows_written: usize,
    /// Invalid or vanished archives, logged and passed over.
    pub skipped: Vec<ArchiveError>,
    pub failed: Vec<ArchiveError>,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}

pub struct Pipeline {
    config: Config,
    client: reqwest::Client,
    downloader: Downloader,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self, PipelineError> {
        config.validate()?;

        let client = config.build_client()?;
        let downloader = Downloader::new(
            client.clone(),
            config.retry_policy(),
            std::time::Duration::from_secs(config.stall_timeout_secs),
            cancel,
        );

        Ok(Pipeline {
            config,
            client,
            downloader,
            show_progress: false,
        })
    }

    /// Draw progress bars on the terminal.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn list_remote(&self) -> Result<Vec<ArchiveRecord>, PipelineError> {
        Ok(index::list_remote(&self.client, &self.config.base_url).await?)
    }

    pub fn list_local(&self) -> Result<Vec<ArchiveRecord>, PipelineError> {
        index::list_local(&self.config.data_dir)
    }

    /// Archive versions that would be downloaded by [`Pipeline::run`].
    pub async fn plan(&self) -> Result<Vec<DownloadTask>, PipelineError> {
        let remote = self.list_remote().await?;
        let local = self.list_local()?;
        let keys: Vec<DiffKey> = filter_years(reconcile(&remote, &local), &self.config.years);

        Ok(keys
            .iter()
            .map(|k| DownloadTask::new(k, &self.config.base_url, &self.config.data_dir))
            .collect())
    }

    /// Synchronizes every new or changed archive.
    ///
    /// Only a listing failure aborts the run; per-archive failures end up in
    /// the summary.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let tasks = self.plan().await?;
        let mut summary = RunSummary {
            planned: tasks.len(),
            ..RunSummary::default()
        };

        if tasks.is_empty() {
            info!("Local archives are up to date");
            return Ok(summary);
        }

        for task in &tasks {
            let span = info_span!("archive", name = %task.timestamped_name);
            let result = self.process(task).instrument(span).await;

            match result {
                Ok(rows) => {
                    summary.downloaded += 1;
                    summary.merged += 1;
                    summary.rows_written += rows;
                }
                Err(e) if is_cancelled(&e) => {
                    warn!(archive = %e.archive, "Run cancelled, partial download removed");
                    summary.cancelled = true;
                    break;
                }
                Err(e) if is_skippable(&e) => {
                    warn!(archive = %e.archive, error = %e, "Skipping archive");
                    summary.skipped.push(e);
                }
                Err(e) => {
                    error!(archive = %e.archive, stage = %e.stage, error = %e, "Archive failed");
                    if e.stage != Stage::Download {
                        summary.downloaded += 1;
                    }
                    summary.failed.push(e);
                }
            }
        }

        info!(
            planned = summary.planned,
            downloaded = summary.downloaded,
            merged = summary.merged,
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            rows = summary.rows_written,
            "Run complete"
        );

        Ok(summary)
    }

    /// Downloads, merges, verifies and saves one archive version.
    pub async fn process(&self, task: &DownloadTask) -> Result<usize, ArchiveError> {
        info!(archive = %task.canonical_name, "Processing starting");

        let bar = self.download_bar(&task.canonical_name);
        let archive_path = self
            .downloader
            .fetch(task, &bar)
            .await
            .map_err(|e| archive_error(&task.timestamped_name, Stage::Download, e))?;
        bar.finish_and_clear();

        let rows = self
            .merge_archive(&archive_path, true)
            .await?
            .unwrap_or_default();
        info!(archive = %task.canonical_name, rows, "Processing complete");

        Ok(rows)
    }

    /// Extracts, verifies and saves an archive already on disk.
    ///
    /// Returns the rows written, or `None` when the archive already carries a
    /// completion marker and `force` is not set.
    pub async fn merge_archive(
        &self,
        archive_path: &Path,
        force: bool,
    ) -> Result<Option<usize>, ArchiveError> {
        let archive = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !force && extract::is_processed(archive_path) {
            info!(archive = %archive, "Already processed, skipping");
            return Ok(None);
        }

        let path: PathBuf = archive_path.to_path_buf();
        let progress = if self.show_progress {
            create_progress_bar(0, format!("Merging {}", archive))
        } else {
            ProgressBar::hidden()
        };
        let write_parquet = self.config.write_parquet;
        let name = archive.clone();

        let rows = tokio::task::spawn_blocking(move || {
            merge_verify_persist(&path, &name, &progress, write_parquet)
        })
        .await
        .map_err(|e| archive_error(&archive, Stage::Merge, e))??;

        Ok(Some(rows))
    }

    fn download_bar(&self, name: &str) -> ProgressBar {
        if self.show_progress {
            create_spinner(format!("Downloading {}", name))
        } else {
            ProgressBar::hidden()
        }
    }
}

fn merge_verify_persist(
    archive_path: &Path,
    archive: &str,
    progress: &ProgressBar,
    write_parquet: bool,
) -> Result<usize, ArchiveError> {
    let marker = extract::marker_path(archive_path);
    if let Err(source) = std::fs::remove_file(&marker) {
        if source.kind() != std::io::ErrorKind::NotFound {
            return Err(archive_error(
                archive,
                Stage::Merge,
                MergeError::Io {
                    path: marker,
                    source,
                },
            ));
        }
    }

    let dataset = extract_and_merge(archive_path, progress)
        .map_err(|e| archive_error(archive, Stage::Merge, e))?;
    progress.finish_and_clear();

    let dir = archive_path.parent().unwrap_or_else(|| Path::new("."));
    let outputs = YearOutputs::new(dir, &dataset.year);

    let (dataset, flags) = match verify(dataset) {
        Ok(verified) => verified,
        Err(e) => {
            if let Err(export_error) = export::persist_flags(&e.flags, &outputs) {
                warn!(archive, error = %export_error, "Failed to save spatial flag files");
            }
            return Err(archive_error(archive, Stage::Verify, e));
        }
    };

    let rows = export::persist_year(&dataset, &flags, &outputs, write_parquet)
        .map_err(|e| archive_error(archive, Stage::Export, e))?;

    // Only a fully saved year is marked as processed
    extract::write_marker(archive_path).map_err(|source| {
        archive_error(archive, Stage::Export, ExportError::Io { path: marker, source })
    })?;

    Ok(rows)
}

fn archive_error(archive: &str, stage: Stage, source: impl Into<PipelineError>) -> ArchiveError {
    ArchiveError {
        archive: archive.to_string(),
        stage,
        source: source.into(),
    }
}

fn is_cancelled(e: &ArchiveError) -> bool {
    matches!(e.source, PipelineError::Download(DownloadError::Cancelled { .. }))
}

fn is_skippable(e: &ArchiveError) -> bool {
    matches!(&e.source, PipelineError::Download(d) if d.is_skippable())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn download_failure(e: DownloadError) -> ArchiveError {
        archive_error("2021_ts_20210331_0838.tar.gz", Stage::Download, e)
    }

    #[test]
    fn should_sort_download_failures() {
        let url = "http://host/2021.tar.gz".to_string();

        let cancelled = download_failure(DownloadError::Cancelled { url: url.clone() });
        assert!(is_cancelled(&cancelled));
        assert!(!is_skippable(&cancelled));

        let missing = download_failure(DownloadError::InvalidUrl {
            url: url.clone(),
            reason: "HTTP 404 Not Found".to_string(),
        });
        assert!(is_skippable(&missing));

        let timeout = download_failure(DownloadError::Timeout { url });
        assert!(!is_skippable(&timeout));
        assert!(!is_cancelled(&timeout));
    }

    #[test]
    fn should_reject_invalid_config() {
        let mut config = Config::default();
        config.base_url = String::new();

        assert!(Pipeline::new(config, CancellationToken::new()).is_err());
    }

    #[test]
    fn should_report_success_only_without_failures() {
        let mut summary = RunSummary::default();
        assert!(summary.is_success());

        summary.cancelled = true;
        assert!(!summary.is_success());
    }
}
