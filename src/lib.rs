//! Keeps a local mirror of the NOAA Global Summary of the Day archive.
//!
//! Each run lists the remote archive directory, compares it against the
//! archives already on disk, downloads new or changed yearly archives, and
//! merges every station CSV of a year into one verified dataset.

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod extract;
pub mod index;
pub mod layout;
pub mod pipeline;
pub mod reading;
pub mod reconcile;
pub mod verify;

pub use config::Config;
pub use download::{Downloader, RetryPolicy};
pub use error::{
    ArchiveError, DownloadError, ExportError, MergeError, PipelineError, RemoteListingError, Result,
    SpatialInconsistencyError, Stage,
};
pub use extract::extract_and_merge;
pub use index::{list_local, list_remote, ArchiveRecord, DiffKey};
pub use pipeline::{Pipeline, RunSummary};
pub use reading::{MergedRow, YearDataset};
pub use reconcile::{reconcile, DownloadTask};
pub use verify::{verify, SpatialFlagSet};
