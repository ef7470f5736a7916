//! Decides which archive versions must be fetched.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::index::{ArchiveRecord, DiffKey};
use crate::layout;

/// Returns every remote archive version that is missing locally.
///
/// Remote rows without a timestamp never produce a key. The result is sorted
/// lexically on the timestamped name, so repeated runs process archives in
/// the same order.
pub fn reconcile(remote: &[ArchiveRecord], local: &[ArchiveRecord]) -> Vec<DiffKey> {
    let remote_keys: BTreeSet<DiffKey> = remote.iter().filter_map(DiffKey::from_remote).collect();
    let local_keys: BTreeSet<DiffKey> = local.iter().filter_map(DiffKey::from_local).collect();

    let diff: Vec<DiffKey> = remote_keys.difference(&local_keys).cloned().collect();

    info!(
        remote = remote_keys.len(),
        local = local_keys.len(),
        changed = diff.len(),
        "New or changed year archives"
    );

    diff
}

/// Keeps only the keys whose year is listed. An empty list keeps everything.
pub fn filter_years(keys: Vec<DiffKey>, years: &[String]) -> Vec<DiffKey> {
    if years.is_empty() {
        return keys;
    }

    keys.into_iter()
        .filter(|k| k.year().is_some_and(|y| years.iter().any(|w| w == y)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One archive version to fetch, consumed once by the downloader.
pub struct DownloadTask {
    pub canonical_name: String,
    pub timestamped_name: String,
    pub source_url: String,
    pub destination_dir: PathBuf,
}

impl DownloadTask {
    pub fn new(key: &DiffKey, base_url: &str, data_dir: &Path) -> Self {
        DownloadTask {
            canonical_name: key.canonical_name.clone(),
            timestamped_name: key.timestamped_name.clone(),
            source_url: format!("{}/{}", base_url.trim_end_matches('/'), key.canonical_name),
            destination_dir: layout::archive_dir(data_dir, &key.canonical_name),
        }
    }

    /// Where the archive lands. Never the canonical name, so every version is kept.
    pub fn destination_path(&self) -> PathBuf {
        self.destination_dir.join(&self.timestamped_name)
    }
}

// -- Tests -------------------------------------------------------------------
