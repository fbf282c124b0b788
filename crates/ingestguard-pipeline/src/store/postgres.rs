use std::time::Duration;

use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type};
use async_trait::async_trait;
use ingestguard_core::Batch;
use sqlx::postgres::{PgPoolOptions, Postgres};
use sqlx::query_builder::Separated;
use sqlx::{PgPool, QueryBuilder, Row};
use tracing::{debug, info};

use super::{ColumnSchema, RecordStore, key_values};
use crate::config::DatabaseConfig;
use crate::errors::StoreError;

/// Postgres caps a statement at 65535 bind parameters.
const MAX_BIND_PARAMS: usize = 65_535;

const TABLE_SCHEMA_QUERY: &str = r#"
    SELECT c.column_name::text AS column_name,
           CASE WHEN c.data_type = 'character varying' AND c.character_maximum_length IS NOT NULL
                THEN 'varchar(' || c.character_maximum_length::int4 || ')'
                ELSE c.data_type::text
           END AS data_type,
           c.is_nullable::text = 'YES' AS nullable,
           EXISTS (
               SELECT 1
               FROM information_schema.table_constraints tc
               JOIN information_schema.constraint_column_usage ccu
                 USING (constraint_schema, constraint_name)
               WHERE tc.constraint_type = 'PRIMARY KEY'
                 AND tc.table_schema = c.table_schema
                 AND tc.table_name = c.table_name
                 AND ccu.column_name = c.column_name
           ) AS primary_key
    FROM information_schema.columns c
    WHERE c.table_schema = 'public' AND c.table_name = $1
    ORDER BY c.ordinal_position
"#;

/// Quote an identifier for interpolation into SQL.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A batch column converted to a type sqlx can bind.
enum BindColumn {
    Int(Int64Array),
    Float(Float64Array),
    Text(StringArray),
    Bool(BooleanArray),
    Date(Date32Array),
}

impl BindColumn {
    fn from_array(name: &str, array: &dyn Array) -> Result<Self, StoreError> {
        let column = match array.data_type() {
            DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                BindColumn::Int(cast(array, &DataType::Int64)?.as_primitive::<Int64Type>().clone())
            }
            DataType::Float32 | DataType::Float64 => BindColumn::Float(
                cast(array, &DataType::Float64)?
                    .as_primitive::<Float64Type>()
                    .clone(),
            ),
            DataType::Utf8 | DataType::LargeUtf8 => {
                BindColumn::Text(cast(array, &DataType::Utf8)?.as_string::<i32>().clone())
            }
            DataType::Boolean => BindColumn::Bool(array.as_boolean().clone()),
            DataType::Date32 => BindColumn::Date(array.as_primitive::<Date32Type>().clone()),
            other => {
                return Err(StoreError::UnsupportedColumn {
                    column: name.to_string(),
                    data_type: other.to_string(),
                });
            }
        };
        Ok(column)
    }

    fn push(&self, row: usize, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        match self {
            BindColumn::Int(a) => values.push_bind(a.is_valid(row).then(|| a.value(row))),
            BindColumn::Float(a) => values.push_bind(a.is_valid(row).then(|| a.value(row))),
            BindColumn::Text(a) => {
                values.push_bind(a.is_valid(row).then(|| a.value(row).to_string()))
            }
            BindColumn::Bool(a) => values.push_bind(a.is_valid(row).then(|| a.value(row))),
            BindColumn::Date(a) => {
                values.push_bind(a.is_valid(row).then(|| a.value_as_date(row)).flatten())
            }
        };
    }
}

/// `RecordStore` backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await?;
        info!(max_connections = config.max_connections, "Database connection pool created");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_ignore(
        &self,
        table: &str,
        key_column: &str,
        batch: &Batch,
    ) -> Result<u64, StoreError> {
        // validates the key before anything is sent
        key_values(batch, key_column)?;
        let schema = batch.schema();
        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| BindColumn::from_array(field.name(), array.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if batch.num_rows() == 0 || columns.is_empty() {
            return Ok(0);
        }

        let column_list = schema
            .fields()
            .iter()
            .map(|f| quote_ident(f.name()))
            .collect::<Vec<_>>()
            .join(", ");
        let rows_per_chunk = (MAX_BIND_PARAMS / columns.len()).max(1);

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        let mut start = 0;
        while start < batch.num_rows() {
            let end = (start + rows_per_chunk).min(batch.num_rows());
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                quote_ident(table),
                column_list
            ));
            builder.push_values(start..end, |mut values, row| {
                for column in &columns {
                    column.push(row, &mut values);
                }
            });
            builder.push(format!(" ON CONFLICT ({}) DO NOTHING", quote_ident(key_column)));
            let result = builder.build().execute(&mut *tx).await?;
            debug!(table, rows = end - start, affected = result.rows_affected(), "insert chunk");
            inserted += result.rows_affected();
            start = end;
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn table_schema(&self, table: &str) -> Result<Vec<ColumnSchema>, StoreError> {
        let rows = sqlx::query(TABLE_SCHEMA_QUERY)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        if rows.is_empty() {
            return Err(StoreError::UnknownTable(table.to_string()));
        }
        rows.iter()
            .map(|row| -> Result<ColumnSchema, StoreError> {
                Ok(ColumnSchema {
                    column: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    nullable: row.try_get("nullable")?,
                    primary_key: row.try_get("primary_key")?,
                })
            })
            .collect()
    }

    async fn row_count(&self, table: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn delete_all_rows(&self, table: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {}", quote_ident(table)))
            .execute(&self.pool)
            .await?;
        info!(table, deleted = result.rows_affected(), "Deleted all rows");
        Ok(result.rows_affected())
    }

    async fn fetch_numeric_column(
        &self,
        table: &str,
        column: &str,
    ) -> Result<Vec<f64>, StoreError> {
        let sql = format!(
            "SELECT {col}::float8 FROM {table} WHERE {col} IS NOT NULL",
            col = quote_ident(column),
            table = quote_ident(table)
        );
        let values: Vec<f64> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(values)
    }
}
