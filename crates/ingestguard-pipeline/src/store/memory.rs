use std::collections::HashSet;

use arrow::array::{Array, AsArray, BooleanArray};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, Float64Type, SchemaRef};
use async_trait::async_trait;
use dashmap::DashMap;
use ingestguard_core::Batch;
use tracing::debug;

use super::{ColumnSchema, RecordStore, key_values, sql_type_name};
use crate::errors::StoreError;

#[derive(Debug)]
struct MemoryTable {
    key_column: String,
    schema: SchemaRef,
    keys: HashSet<i64>,
    batches: Vec<Batch>,
}

impl MemoryTable {
    fn row_count(&self) -> u64 {
        self.batches.iter().map(|b| b.num_rows() as u64).sum()
    }
}

/// In-process store with the same insert-ignore semantics as `PgStore`.
/// A table is created by its first insert.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: DashMap<String, MemoryTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|t| t.key().clone()).collect();
        names.sort();
        names
    }

    /// Stored keys of `table`, in insertion order.
    pub fn stored_keys(&self, table: &str) -> Result<Vec<i64>, StoreError> {
        let entry = self
            .tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let mut keys = Vec::new();
        for batch in &entry.batches {
            keys.extend(key_values(batch, &entry.key_column)?.iter().flatten());
        }
        Ok(keys)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_ignore(
        &self,
        table: &str,
        key_column: &str,
        batch: &Batch,
    ) -> Result<u64, StoreError> {
        let keys = key_values(batch, key_column)?;
        for field in batch.schema().fields() {
            if sql_type_name(field.data_type()).is_none() {
                return Err(StoreError::UnsupportedColumn {
                    column: field.name().clone(),
                    data_type: field.data_type().to_string(),
                });
            }
        }

        let mut entry = self
            .tables
            .entry(table.to_string())
            .or_insert_with(|| MemoryTable {
                key_column: key_column.to_string(),
                schema: batch.schema(),
                keys: HashSet::new(),
                batches: Vec::new(),
            });

        // null keys are rejected the way a primary key constraint would
        let keep: BooleanArray = keys
            .iter()
            .map(|key| Some(key.is_some_and(|k| entry.keys.insert(k))))
            .collect();
        let fresh = filter_record_batch(batch, &keep)?;
        let inserted = fresh.num_rows() as u64;
        if inserted > 0 {
            entry.batches.push(fresh);
        }
        debug!(table, inserted, total = entry.row_count(), "insert_ignore");
        Ok(inserted)
    }

    async fn table_schema(&self, table: &str) -> Result<Vec<ColumnSchema>, StoreError> {
        let entry = self
            .tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        entry
            .schema
            .fields()
            .iter()
            .map(|field| {
                let data_type = sql_type_name(field.data_type()).ok_or_else(|| {
                    StoreError::UnsupportedColumn {
                        column: field.name().clone(),
                        data_type: field.data_type().to_string(),
                    }
                })?;
                let primary_key = field.name() == &entry.key_column;
                Ok(ColumnSchema {
                    column: field.name().clone(),
                    data_type: data_type.to_string(),
                    nullable: field.is_nullable() && !primary_key,
                    primary_key,
                })
            })
            .collect()
    }

    async fn row_count(&self, table: &str) -> Result<u64, StoreError> {
        self.tables
            .get(table)
            .map(|t| t.row_count())
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    async fn delete_all_rows(&self, table: &str) -> Result<u64, StoreError> {
        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let deleted = entry.row_count();
        entry.batches.clear();
        entry.keys.clear();
        Ok(deleted)
    }

    async fn fetch_numeric_column(
        &self,
        table: &str,
        column: &str,
    ) -> Result<Vec<f64>, StoreError> {
        let entry = self
            .tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let mut values = Vec::new();
        for batch in &entry.batches {
            let array = batch
                .column_by_name(column)
                .ok_or_else(|| StoreError::UnsupportedColumn {
                    column: column.to_string(),
                    data_type: "missing".to_string(),
                })?;
            if !array.data_type().is_numeric() {
                return Err(StoreError::UnsupportedColumn {
                    column: column.to_string(),
                    data_type: array.data_type().to_string(),
                });
            }
            let floats = cast(array, &DataType::Float64)?;
            values.extend(floats.as_primitive::<Float64Type>().iter().flatten());
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn customers(ids: Vec<Option<i64>>) -> Batch {
        let names: Vec<String> = (0..ids.len()).map(|i| format!("name {i}")).collect();
        let schema = Schema::new(vec![
            Field::new("customer_id", DataType::Int64, true),
            Field::new("name", DataType::Utf8, true),
        ]);
        Batch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(names)),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_second_insert_is_ignored() {
        let store = MemoryStore::new();
        let batch = customers(vec![Some(1693133), Some(887837)]);
        assert_eq!(
            store.insert_ignore("customers", "customer_id", &batch).await.unwrap(),
            2
        );
        assert_eq!(
            store.insert_ignore("customers", "customer_id", &batch).await.unwrap(),
            0
        );
        assert_eq!(store.row_count("customers").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_and_null_keys_within_batch() {
        let store = MemoryStore::new();
        let batch = customers(vec![Some(1), Some(1), None, Some(2)]);
        let inserted = store
            .insert_ignore("customers", "customer_id", &batch)
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.stored_keys("customers").unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_delete_all_rows_allows_reinsert() {
        let store = MemoryStore::new();
        let batch = customers(vec![Some(5)]);
        store
            .insert_ignore("customers", "customer_id", &batch)
            .await
            .unwrap();
        assert_eq!(store.delete_all_rows("customers").await.unwrap(), 1);
        assert_eq!(store.row_count("customers").await.unwrap(), 0);
        assert_eq!(
            store.insert_ignore("customers", "customer_id", &batch).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_schema_marks_primary_key() {
        let store = MemoryStore::new();
        store
            .insert_ignore("customers", "customer_id", &customers(vec![Some(1)]))
            .await
            .unwrap();
        let schema = store.table_schema("customers").await.unwrap();
        assert_eq!(
            schema[0],
            ColumnSchema {
                column: "customer_id".to_string(),
                data_type: "bigint".to_string(),
                nullable: false,
                primary_key: true,
            }
        );
        assert_eq!(schema[1].data_type, "text");
        assert!(schema[1].nullable);
        assert!(matches!(
            store.table_schema("orders").await,
            Err(StoreError::UnknownTable(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_numeric_column() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("age", DataType::Float64, true),
        ]);
        let batch = Batch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(Float64Array::from(vec![Some(34.0), None, Some(71.5)])),
            ],
        )
        .unwrap();
        let store = MemoryStore::new();
        store
            .insert_ignore("customer_profile", "id", &batch)
            .await
            .unwrap();
        assert_eq!(
            store
                .fetch_numeric_column("customer_profile", "age")
                .await
                .unwrap(),
            vec![34.0, 71.5]
        );
        assert_eq!(
            store
                .fetch_numeric_column("customer_profile", "id")
                .await
                .unwrap(),
            vec![1.0, 2.0, 3.0]
        );
    }
}
