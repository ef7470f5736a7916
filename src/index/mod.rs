//! Normalized archive inventories, remote and local.

pub mod local;
pub mod remote;

use chrono::NaiveDateTime;

pub use local::list_local;
pub use remote::{list_remote, parse_listing};

/// Suffix shared by every archive, canonical or timestamped.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Separator between the year and the encoded timestamp in a timestamped name.
pub const TIMESTAMP_SEPARATOR: &str = "_ts_";

/// Format of the timestamp embedded in a timestamped name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

#[derive(Debug, Clone, PartialEq, Eq)]
/// One archive as seen in the remote listing or on the local disk.
///
/// A listing row with a blank date has no timestamp; such rows never take
/// part in reconciliation.
pub struct ArchiveRecord {
    pub name: String,
    pub timestamp: Option<NaiveDateTime>,
    pub size_kb: u64,
}

impl ArchiveRecord {
    pub fn new(name: impl Into<String>, timestamp: Option<NaiveDateTime>, size_kb: u64) -> Self {
        ArchiveRecord {
            name: name.into(),
            timestamp,
            size_kb,
        }
    }

    /// The year prefix of the archive name, e.g. `2021` for `2021_ts_...tar.gz`.
    pub fn year(&self) -> Option<&str> {
        year_of(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identity of one archive version.
///
/// Field order matters: the derived ordering sorts on the timestamped name
/// first, which gives the reconciler its stable processing order.
pub struct DiffKey {
    pub timestamped_name: String,
    pub canonical_name: String,
}

impl DiffKey {
    /// Key for a remote archive: `2021.tar.gz` at `2021-03-31 08:38` becomes
    /// `2021_ts_20210331_0838.tar.gz`.
    pub fn from_remote(record: &ArchiveRecord) -> Option<Self> {
        let timestamp = record.timestamp?;
        let stem = record.name.strip_suffix(ARCHIVE_SUFFIX)?;

        Some(DiffKey {
            timestamped_name: format!(
                "{}{}{}{}",
                stem,
                TIMESTAMP_SEPARATOR,
                timestamp.format(TIMESTAMP_FORMAT),
                ARCHIVE_SUFFIX
            ),
            canonical_name: record.name.clone(),
        })
    }

    /// Key for a local archive, whose file name is already the timestamped name.
    pub fn from_local(record: &ArchiveRecord) -> Option<Self> {
        let year = record.year()?;

        Some(DiffKey {
            timestamped_name: record.name.clone(),
            canonical_name: format!("{}{}", year, ARCHIVE_SUFFIX),
        })
    }

    pub fn year(&self) -> Option<&str> {
        year_of(&self.canonical_name)
    }
}

/// Returns the leading four-digit year of an archive name.
pub fn year_of(name: &str) -> Option<&str> {
    let year = name.get(..4)?;
    year.bytes().all(|b| b.is_ascii_digit()).then_some(year)
}

// -- Tests -------------------------------------------------------------------
