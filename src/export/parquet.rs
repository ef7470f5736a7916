//! Save a merged year to a parquet file.

use std::{fs::File, path::Path, sync::Arc};

use arrow::{
    array::{ArrayRef, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};

use crate::error::ExportError;
use crate::reading::{merged_header, YearDataset};

/// Rows per record batch.
const CHUNK_SIZE: usize = 100_000;

pub fn save_year(dataset: &YearDataset, file_path: &Path) -> Result<(), ExportError> {
    super::write_atomically(file_path, |partial| write_to(dataset, partial))
}

fn write_to(dataset: &YearDataset, file_path: &Path) -> Result<(), ExportError> {
    let parquet_error = |source| ExportError::Parquet {
        path: file_path.to_path_buf(),
        source,
    };

    let file = File::create(file_path).map_err(|source| ExportError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;

    // Every column is kept as text, matching the CSV output
    let header = merged_header();
    let schema = Arc::new(Schema::new(
        header
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    ));

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .set_dictionary_enabled(true)
        .build();

    let mut writer =
        ArrowWriter::try_new(file, schema.clone(), Some(props)).map_err(parquet_error)?;

    for chunk in dataset.rows().chunks(CHUNK_SIZE) {
        let mut builders: Vec<StringBuilder> = header
            .iter()
            .map(|_| StringBuilder::with_capacity(chunk.len(), chunk.len() * 8))
            .collect();

        for row in chunk {
            for (builder, value) in builders.iter_mut().zip(row.fields()) {
                builder.append_value(value);
            }
        }

        let columns: Vec<ArrayRef> = builders
            .iter_mut()
            .map(|b| Arc::new(b.finish()) as ArrayRef)
            .collect();

        let batch = RecordBatch::try_new(schema.clone(), columns).map_err(|source| {
            ExportError::Arrow {
                path: file_path.to_path_buf(),
                source,
            }
        })?;

        writer.write(&batch).map_err(parquet_error)?;
    }

    writer.close().map_err(parquet_error)?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
