//! Persists a verified year and its side files.
//!
//! Every file is written to a `.partial` sibling and renamed into place, so a
//! failed write never leaves a truncated output under its final name.

pub mod csv;
pub mod parquet;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ExportError;
use crate::layout::YearOutputs;
use crate::reading::YearDataset;
use crate::verify::SpatialFlagSet;

/// Writes the merged CSV, both flag files and, when asked, the parquet copy.
///
/// Returns the number of data rows written to the merged CSV. On error every
/// output of this call is removed again.
pub fn persist_year(
    dataset: &YearDataset,
    flags: &SpatialFlagSet,
    outputs: &YearOutputs,
    write_parquet: bool,
) -> Result<usize, ExportError> {
    let written = match write_year(dataset, flags, outputs, write_parquet) {
        Ok(written) => written,
        Err(e) => {
            for path in [
                &outputs.full_csv,
                &outputs.missing_lat_long,
                &outputs.missing_only_elevation,
                &outputs.full_parquet,
            ] {
                discard(path);
            }
            return Err(e);
        }
    };

    info!(
        year = %dataset.year,
        rows = written,
        path = %outputs.full_csv.display(),
        "Year dataset saved"
    );

    Ok(written)
}

fn write_year(
    dataset: &YearDataset,
    flags: &SpatialFlagSet,
    outputs: &YearOutputs,
    write_parquet: bool,
) -> Result<usize, ExportError> {
    let written = csv::write_rows(&outputs.full_csv, dataset.rows())?;
    csv::write_rows(&outputs.missing_lat_long, &flags.missing_lat_long)?;
    csv::write_rows(&outputs.missing_only_elevation, &flags.missing_only_elevation)?;

    if write_parquet {
        parquet::save_year(dataset, &outputs.full_parquet)?;
    }

    Ok(written)
}

/// Writes every partition of a year that failed spatial verification.
pub fn persist_flags(flags: &SpatialFlagSet, outputs: &YearOutputs) -> Result<(), ExportError> {
    csv::write_rows(&outputs.missing_lat_long, &flags.missing_lat_long)?;
    csv::write_rows(&outputs.missing_only_elevation, &flags.missing_only_elevation)?;
    csv::write_rows(&outputs.inconsistent_spatial, &flags.inconsistent_station)?;
    Ok(())
}

/// `2021_full.csv` -> `2021_full.csv.partial`
pub(crate) fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Runs `write` against the partial path, then renames it over `path`.
pub(crate) fn write_atomically<T>(
    path: &Path,
    write: impl FnOnce(&Path) -> Result<T, ExportError>,
) -> Result<T, ExportError> {
    let partial = partial_path(path);

    let result = write(&partial).and_then(|value| {
        std::fs::rename(&partial, path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(value)
    });

    if result.is_err() {
        discard(&partial);
    }
    result
}

fn discard(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed incomplete output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!(path = %path.display(), error = %e, "Failed to remove incomplete output"),
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::MergedRow;
    use ::csv::StringRecord;
    use tempfile::TempDir;

    fn dataset() -> YearDataset {
        let mut fields = vec!["S1".to_string(), "2021-01-01".to_string()];
        fields.extend(std::iter::repeat("1".to_string()).take(26));
        let row = MergedRow::from_record(&StringRecord::from(fields), "S1.csv").unwrap();
        YearDataset::new("2021", vec![row])
    }

    #[test]
    fn should_name_partial_file_beside_output() {
        assert_eq!(
            partial_path(Path::new("/data/2021/2021_full.csv")),
            PathBuf::from("/data/2021/2021_full.csv.partial")
        );
    }

    #[test]
    fn should_save_year_without_leftovers() {
        let tmp = TempDir::new().unwrap();
        let outputs = YearOutputs::new(tmp.path(), "2021");

        let written = persist_year(&dataset(), &SpatialFlagSet::default(), &outputs, true).unwrap();

        assert_eq!(written, 1);
        assert!(outputs.full_csv.is_file());
        assert!(outputs.full_parquet.is_file());
        assert!(!partial_path(&outputs.full_csv).exists());
    }

    #[test]
    fn should_remove_written_outputs_when_a_later_file_fails() {
        let tmp = TempDir::new().unwrap();
        let outputs = YearOutputs::new(tmp.path(), "2021");
        // A directory in place of the parquet file makes the final rename fail
        std::fs::create_dir_all(outputs.full_parquet.join("blocker")).unwrap();

        let err = persist_year(&dataset(), &SpatialFlagSet::default(), &outputs, true).unwrap_err();

        assert!(matches!(err, ExportError::Io { .. }));
        assert!(!outputs.full_csv.exists());
        assert!(!outputs.missing_lat_long.exists());
        assert!(!outputs.missing_only_elevation.exists());
        assert!(!partial_path(&outputs.full_parquet).exists());
    }
}
