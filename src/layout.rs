//! Local directory layout.
//!
//! ```text
//! {data_dir}/{year}/{year}_ts_{YYYYMMDD_HHMM}.tar.gz   downloaded archive version
//! {data_dir}/{year}/{year}_ts_{YYYYMMDD_HHMM}          completion marker
//! {data_dir}/{year}/{year}_full.csv                    merged dataset
//! {data_dir}/{year}/{year}_missing_lat_long.csv
//! {data_dir}/{year}/{year}_missing_only_elevation.csv
//! ```

use std::path::{Path, PathBuf};

use crate::index::ARCHIVE_SUFFIX;

/// Directory holding every version of one canonical archive.
pub fn archive_dir(data_dir: &Path, canonical_name: &str) -> PathBuf {
    data_dir.join(strip_archive_suffix(canonical_name))
}

pub fn strip_archive_suffix(name: &str) -> &str {
    name.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Output paths for one year's artifacts.
pub struct YearOutputs {
    pub full_csv: PathBuf,
    pub full_parquet: PathBuf,
    pub missing_lat_long: PathBuf,
    pub missing_only_elevation: PathBuf,
    pub inconsistent_spatial: PathBuf,
}

impl YearOutputs {
    pub fn new(dir: &Path, year: &str) -> Self {
        YearOutputs {
            full_csv: dir.join(format!("{}_full.csv", year)),
            full_parquet: dir.join(format!("{}_full.parquet", year)),
            missing_lat_long: dir.join(format!("{}_missing_lat_long.csv", year)),
            missing_only_elevation: dir.join(format!("{}_missing_only_elevation.csv", year)),
            inconsistent_spatial: dir.join(format!("{}_inconsistent_spatial.csv", year)),
        }
    }
}

// -- Tests -------------------------------------------------------------------
