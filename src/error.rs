//! Error types for each stage of the archive pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The remote listing could not be fetched or no longer has the expected layout.
///
/// Always fatal for a run: a malformed listing means the source format changed.
#[derive(Debug, Error)]
pub enum RemoteListingError {
    #[error("Failed to fetch archive listing from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Archive listing at {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Archive listing at {url} has an unexpected layout: {reason}")]
    Layout { url: String, reason: String },

    #[error("Archive listing at {url} has an unparseable date '{value}' for {name}")]
    Timestamp {
        url: String,
        name: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Failure while fetching a single archive.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Connection refused fetching {url}")]
    ConnectionRefused { url: String },

    #[error("Invalid or missing archive at {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unexpected failure fetching {url}")]
    Unexpected {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Download of {url} cancelled")]
    Cancelled { url: String },

    #[error("Failed to write archive to '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Transient network conditions that are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DownloadError::Timeout { .. } | DownloadError::ConnectionRefused { .. }
        )
    }

    /// Failures that are logged and skipped without stopping the batch.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            DownloadError::InvalidUrl { .. } | DownloadError::Unexpected { .. }
        )
    }
}

/// Failure while extracting and merging an archive.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error(
        "Row count mismatch merging {archive}: {counted} rows read from members, {merged} rows merged"
    )]
    Integrity {
        archive: String,
        counted: usize,
        merged: usize,
    },

    #[error("Member {member} of {archive} line {line}: expected {expected} fields, found {found}")]
    Schema {
        archive: String,
        member: String,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Archive {archive} contains member {member} more than once")]
    DuplicateMember { archive: String, member: String },

    #[error("Archive name '{name}' does not start with a year")]
    ArchiveName { name: String },

    #[error("Failed to read archive '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse member {member} of {archive}")]
    Csv {
        archive: String,
        member: String,
        #[source]
        source: csv::Error,
    },
}

/// One or more stations report more than one distinct (lat, long, elevation).
///
/// Detection only: nothing is repaired. The flag set is carried so the caller
/// can persist every partition, including the offending rows, for review.
#[derive(Debug, Error)]
#[error("Spatial data is not consistent for {year} stations: {}", .station_ids.join(", "))]
pub struct SpatialInconsistencyError {
    pub year: String,
    pub station_ids: Vec<String>,
    pub flags: crate::verify::SpatialFlagSet,
}

/// Failure while persisting a dataset or one of its side files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to create '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV '{path}'")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write parquet '{path}'")]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("Failed to build record batch for '{path}'")]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },
}

/// Pipeline stage in which a per-archive failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Merge,
    Verify,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Download => "download",
            Stage::Merge => "merge",
            Stage::Verify => "verify",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// A failure scoped to one archive, with enough context to retry that year.
#[derive(Debug, Error)]
#[error("{stage} failed for {archive}: {source}")]
pub struct ArchiveError {
    pub archive: String,
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

/// Every error the core can raise.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Listing(#[from] RemoteListingError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Spatial(#[from] SpatialInconsistencyError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Failed to scan local archives in '{path}'")]
    LocalIndex {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

// -- Tests -------------------------------------------------------------------
