//! CSV output with the merged header.

use std::{fs::File, io::BufWriter, path::Path};

use csv::{QuoteStyle, WriterBuilder};

use crate::error::ExportError;
use crate::reading::{merged_header, MergedRow};

/// Writes `rows` under the merged header, quoting only where needed.
pub fn write_rows(path: &Path, rows: &[MergedRow]) -> Result<usize, ExportError> {
    super::write_atomically(path, |partial| write_to(partial, rows))
}

fn write_to(path: &Path, rows: &[MergedRow]) -> Result<usize, ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let csv_error = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(BufWriter::new(file));

    writer.write_record(merged_header()).map_err(csv_error)?;
    for row in rows {
        writer.write_record(row.fields()).map_err(csv_error)?;
    }

    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(rows.len())
}

// -- Tests -------------------------------------------------------------------
