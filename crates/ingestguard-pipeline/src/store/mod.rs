//! Persistence of cleaned batches.
//!
//! Inserts are insert-ignore on the table's natural key: rows whose key is
//! already stored are skipped, so replaying a file inserts nothing new.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use arrow::array::{AsArray, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int64Type};
use async_trait::async_trait;
use ingestguard_core::Batch;
use serde::Serialize;

use crate::errors::StoreError;

/// One column of a stored table, as reported by `table_schema`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub column: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert every row of `batch` whose `key_column` value is not stored yet.
    /// Returns the number of rows actually inserted.
    async fn insert_ignore(
        &self,
        table: &str,
        key_column: &str,
        batch: &Batch,
    ) -> Result<u64, StoreError>;

    async fn table_schema(&self, table: &str) -> Result<Vec<ColumnSchema>, StoreError>;

    async fn row_count(&self, table: &str) -> Result<u64, StoreError>;

    /// Remove all rows, returning how many were deleted.
    async fn delete_all_rows(&self, table: &str) -> Result<u64, StoreError>;

    /// Read a numeric column as `f64`, skipping nulls.
    async fn fetch_numeric_column(&self, table: &str, column: &str)
    -> Result<Vec<f64>, StoreError>;
}

/// Key column of `batch` widened to `Int64`.
pub(crate) fn key_values(batch: &Batch, key_column: &str) -> Result<Int64Array, StoreError> {
    let column = batch
        .column_by_name(key_column)
        .ok_or_else(|| StoreError::InvalidKey(key_column.to_string()))?;
    if !column.data_type().is_integer() {
        return Err(StoreError::InvalidKey(key_column.to_string()));
    }
    let keys = cast(column, &DataType::Int64)?;
    Ok(keys.as_primitive::<Int64Type>().clone())
}

/// Postgres type name used for an Arrow column type.
pub(crate) fn sql_type_name(data_type: &DataType) -> Option<&'static str> {
    match data_type {
        DataType::Int16 => Some("smallint"),
        DataType::Int32 => Some("integer"),
        DataType::Int64 => Some("bigint"),
        DataType::Float32 => Some("real"),
        DataType::Float64 => Some("double precision"),
        DataType::Utf8 | DataType::LargeUtf8 => Some("text"),
        DataType::Boolean => Some("boolean"),
        DataType::Date32 => Some("date"),
        _ => None,
    }
}
