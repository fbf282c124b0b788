use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use arrow::csv::WriterBuilder;
use tracing::warn;

use crate::{Batch, IngestError};

/// Write rows that failed validation to a CSV file for manual follow-up.
///
/// `target` is either a directory, receiving `bad_<table>_rows.csv`, or an
/// explicit file path. A target that does not exist yet is treated as a
/// directory when it ends with a separator or has no extension. Missing
/// directories are created.
pub fn write_invalid_rows(
    target: impl AsRef<Path>,
    table: &str,
    batch: &Batch,
) -> Result<PathBuf, IngestError> {
    let path = resolve_export_path(target.as_ref(), table)?;
    let file = File::create(&path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;

    warn!(
        table = table,
        rows = batch.num_rows(),
        path = %path.display(),
        "{} invalid {} row(s) exported",
        batch.num_rows(),
        table
    );
    Ok(path)
}

fn resolve_export_path(target: &Path, table: &str) -> Result<PathBuf, IngestError> {
    let filename = format!("bad_{}_rows.csv", table);

    if target.exists() {
        return Ok(if target.is_dir() {
            target.join(filename)
        } else {
            target.to_path_buf()
        });
    }

    let raw = target.as_os_str().to_string_lossy();
    if raw.ends_with('/') || raw.ends_with('\\') || target.extension().is_none() {
        fs::create_dir_all(target)?;
        return Ok(target.join(filename));
    }
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(target.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_csv_batch;
    use arrow::array::{Float64Array, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn bad_products() -> Batch {
        RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("product_id", DataType::Int64, true),
                Field::new("unit_price_usd", DataType::Float64, true),
            ])),
            vec![
                Arc::new(Int64Array::from(vec![1934])),
                Arc::new(Float64Array::from(vec![499.09])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_existing_directory() {
        let dir = TempDir::new().unwrap();
        let path = write_invalid_rows(dir.path(), "products", &bad_products()).unwrap();
        assert_eq!(path, dir.path().join("bad_products_rows.csv"));

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "product_id,unit_price_usd\n1934,499.09\n");
    }

    #[test]
    fn test_new_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("data").join("invalid_rows");
        let path = write_invalid_rows(&target, "products", &bad_products()).unwrap();
        assert!(target.is_dir());
        assert_eq!(path, target.join("bad_products_rows.csv"));
    }

    #[test]
    fn test_explicit_file_path() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out").join("rejected.csv");
        let path = write_invalid_rows(&target, "products", &bad_products()).unwrap();
        assert_eq!(path, target);

        let reread = read_csv_batch(&path).unwrap();
        assert_eq!(reread.num_rows(), 1);
        assert_eq!(reread.schema().field(0).name(), "product_id");
    }
}
