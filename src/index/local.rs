//! Reads the inventory of archives already on disk.

use std::path::Path;

use chrono::{DateTime, Local};
use tracing::debug;
use walkdir::WalkDir;

use super::{ArchiveRecord, ARCHIVE_SUFFIX};
use crate::error::PipelineError;
use crate::extract::is_processed;

/// Lists every processed `*.tar.gz` under `root`, using file modification
/// time and size.
///
/// An archive without its completion marker is left out, so an interrupted or
/// failed version is reconciled as due again. A missing or empty root yields
/// an empty list: the first run has nothing local.
pub fn list_local(root: &Path) -> Result<Vec<ArchiveRecord>, PipelineError> {
    if !root.exists() {
        debug!(root = %root.display(), "Local archive directory does not exist yet");
        return Ok(Vec::new());
    }

    let mut records = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| PipelineError::LocalIndex {
            path: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(ARCHIVE_SUFFIX) {
            continue;
        }

        if !is_processed(entry.path()) {
            debug!(archive = %name, "Archive has no completion marker, treating as due");
            continue;
        }

        let metadata = entry.metadata().map_err(|source| PipelineError::LocalIndex {
            path: entry.path().to_path_buf(),
            source,
        })?;

        let timestamp = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Local>::from(t).naive_local());
        let size_kb = (metadata.len() as f64 / 1000.0).round() as u64;

        records.push(ArchiveRecord::new(name.into_owned(), timestamp, size_kb));
    }

    records.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(root = %root.display(), archives = records.len(), "Local archives found");

    Ok(records)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn should_return_empty_for_missing_root() {
        let tmp = TempDir::new().unwrap();
        let records = list_local(&tmp.path().join("nothing-here")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn should_return_empty_for_empty_root() {
        let tmp = TempDir::new().unwrap();
        assert!(list_local(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn should_find_nested_archives_only() {
        let tmp = TempDir::new().unwrap();
        let year_dir = tmp.path().join("2021");
        fs::create_dir_all(&year_dir).unwrap();
        fs::write(year_dir.join("2021_ts_20210331_0838.tar.gz"), vec![0u8; 2000]).unwrap();
        fs::write(year_dir.join("2021_ts_20210331_0838"), b"").unwrap();
        fs::write(year_dir.join("2021_full.csv"), b"STATION\n").unwrap();

        let records = list_local(tmp.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "2021_ts_20210331_0838.tar.gz");
        assert_eq!(records[0].size_kb, 2);
        assert!(records[0].timestamp.is_some());
    }

    #[test]
    fn should_leave_out_archives_without_marker() {
        let tmp = TempDir::new().unwrap();
        let year_dir = tmp.path().join("2020");
        fs::create_dir_all(&year_dir).unwrap();
        fs::write(year_dir.join("2020_ts_20201231_2359.tar.gz"), vec![0u8; 10]).unwrap();
        fs::write(year_dir.join("2020_ts_20210105_1200.tar.gz"), vec![0u8; 10]).unwrap();
        fs::write(year_dir.join("2020_ts_20210105_1200"), b"").unwrap();

        let records = list_local(tmp.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "2020_ts_20210105_1200.tar.gz");
    }
}
