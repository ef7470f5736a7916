//! Unpacks a yearly archive in memory and merges its station files.
//!
//! Each member is one station's CSV for the year. Headers are dropped, every
//! data row is tagged with its member name, and the merged row count is
//! checked against the data lines counted as each tar entry is read.

pub mod marker;
pub mod store;

use std::{
    io::{Cursor, Read},
    path::Path,
};

use flate2::read::GzDecoder;
use indicatif::ProgressBar;
use tar::Archive;
use tracing::{debug, info};

use crate::error::MergeError;
use crate::index::{year_of, TIMESTAMP_SEPARATOR};
use crate::reading::{MergedRow, YearDataset, OBSERVATION_COLUMNS};

pub use marker::{is_processed, marker_path, write_marker};
pub use store::MemoryStore;

/// Extracts and merges the archive at `archive_path`.
///
/// The completion marker is left to the caller, once the dataset has been
/// verified and saved.
pub fn extract_and_merge(
    archive_path: &Path,
    progress: &ProgressBar,
) -> Result<YearDataset, MergeError> {
    let archive_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let year = year_of(&archive_name)
        .ok_or_else(|| MergeError::ArchiveName {
            name: archive_name.clone(),
        })?
        .to_string();

    let io_error = |source| MergeError::Io {
        path: archive_path.to_path_buf(),
        source,
    };

    let mut store = MemoryStore::new();
    store.insert(archive_name.as_str(), std::fs::read(archive_path).map_err(io_error)?);

    info!(archive = %archive_name, "Extract starting");
    let counted = unpack(&mut store, &archive_name, &year).map_err(|e| match e {
        UnpackError::Io(source) => io_error(source),
        UnpackError::Duplicate(member) => MergeError::DuplicateMember {
            archive: archive_name.clone(),
            member,
        },
    })?;
    info!(
        archive = %archive_name,
        members = store.len(),
        bytes = store.total_bytes(),
        "Extract complete"
    );

    let rows = merge(&store, &archive_name, counted, progress)?;
    drop(store);

    Ok(YearDataset::new(year, rows))
}

enum UnpackError {
    Io(std::io::Error),
    Duplicate(String),
}

impl From<std::io::Error> for UnpackError {
    fn from(e: std::io::Error) -> Self {
        UnpackError::Io(e)
    }
}

/// Replaces the archive entry in `store` with its regular members, skipping
/// the embedded timestamp file. Returns the data lines counted per entry.
fn unpack(store: &mut MemoryStore, archive_name: &str, year: &str) -> Result<usize, UnpackError> {
    let bytes = store.remove(archive_name).unwrap_or_default();
    let exclude = format!("{}{}", year, TIMESTAMP_SEPARATOR);

    let mut archive = Archive::new(GzDecoder::new(Cursor::new(bytes)));
    let mut counted = 0usize;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?;
        let name = path.to_string_lossy();
        let name = name.strip_prefix("./").unwrap_or(&name).to_string();

        if name.contains(&exclude) {
            debug!(member = %name, "Skipping timestamp member");
            continue;
        }
        if store.contains(&name) {
            return Err(UnpackError::Duplicate(name));
        }

        let mut content = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut content)?;
        counted += count_data_lines(&content);
        store.insert(name, content);
    }

    Ok(counted)
}

fn merge(
    store: &MemoryStore,
    archive_name: &str,
    counted: usize,
    progress: &ProgressBar,
) -> Result<Vec<MergedRow>, MergeError> {
    info!(archive = %archive_name, "Merge starting");
    progress.set_length(store.len() as u64);
    progress.set_position(0);

    let mut rows = Vec::new();

    for (member, bytes) in store.iter() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        for record in reader.records() {
            let record = record.map_err(|source| MergeError::Csv {
                archive: archive_name.to_string(),
                member: member.to_string(),
                source,
            })?;

            let row = MergedRow::from_record(&record, member).map_err(|found| {
                MergeError::Schema {
                    archive: archive_name.to_string(),
                    member: member.to_string(),
                    line: record.position().map(|p| p.line()).unwrap_or(0),
                    expected: OBSERVATION_COLUMNS.len(),
                    found,
                }
            })?;
            rows.push(row);
        }

        progress.inc(1);
    }

    if counted != rows.len() {
        return Err(MergeError::Integrity {
            archive: archive_name.to_string(),
            counted,
            merged: rows.len(),
        });
    }

    info!(archive = %archive_name, rows = rows.len(), "Merge complete");
    Ok(rows)
}

/// Number of non-blank physical lines after the header line.
fn count_data_lines(bytes: &[u8]) -> usize {
    bytes
        .split(|&b| b == b'\n')
        .filter(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .count()
        .saturating_sub(1)
}

// -- Tests -------------------------------------------------------------------
