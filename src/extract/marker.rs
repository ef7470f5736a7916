//! Zero-byte completion markers next to processed archives.

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use crate::layout::strip_archive_suffix;

/// `.../2021_ts_20210331_0838.tar.gz` -> `.../2021_ts_20210331_0838`
pub fn marker_path(archive_path: &Path) -> PathBuf {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    archive_path.with_file_name(strip_archive_suffix(&name))
}

pub fn write_marker(archive_path: &Path) -> io::Result<PathBuf> {
    let path = marker_path(archive_path);
    File::create(&path)?;
    Ok(path)
}

/// True once the archive at this path has been fully processed.
pub fn is_processed(archive_path: &Path) -> bool {
    marker_path(archive_path).is_file()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn should_strip_archive_suffix() {
        let path = Path::new("/data/2021/2021_ts_20210331_0838.tar.gz");
        assert_eq!(
            marker_path(path),
            PathBuf::from("/data/2021/2021_ts_20210331_0838")
        );
    }

    #[test]
    fn should_write_empty_marker() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("1929_ts_20190221_0305.tar.gz");

        assert!(!is_processed(&archive));
        let marker = write_marker(&archive).unwrap();

        assert!(is_processed(&archive));
        assert_eq!(std::fs::metadata(marker).unwrap().len(), 0);
    }
}
