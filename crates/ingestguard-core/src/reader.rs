//! CSV loading into a single all-text [`Batch`].
//!
//! Raw ingestion files are read with every column typed as UTF-8; the cleaner
//! is responsible for converting values to their canonical types. Files that are
//! not valid UTF-8 are decoded as Latin-1, which is how the legacy customer and
//! product exports are encoded.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder as CsvReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::{Batch, IngestError};

const BATCH_SIZE: usize = 8 * 1024;

/// Read a whole CSV file into one batch of UTF-8 columns.
pub fn read_csv_batch(path: impl AsRef<Path>) -> Result<Batch, IngestError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let text = decode(bytes);
    read_csv_str(&text).map_err(|e| match e {
        IngestError::EmptyFile(_) => IngestError::EmptyFile(path.display().to_string()),
        other => other,
    })
}

/// Read CSV content already held in memory.
pub fn read_csv_str(text: &str) -> Result<Batch, IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(IngestError::EmptyFile(String::from("<memory>")));
    }
    let schema = Arc::new(csv_generate_schema(text)?);

    let reader = CsvReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(Cursor::new(text.as_bytes()))?;

    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(concat_batches(&schema, &batches)?)
}

/// Generate a UTF-8 schema from the CSV header line
fn csv_generate_schema(text: &str) -> Result<Schema, IngestError> {
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(text.as_bytes()), Some(0))?;
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| Field::new(f.name().trim(), DataType::Utf8, true))
        .collect();
    Ok(Schema::new(fields))
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        // Latin-1 maps every byte to the code point of the same value
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}
