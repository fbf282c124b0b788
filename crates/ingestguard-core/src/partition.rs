//! Split a batch into valid and invalid rows from a complete validation result.

use std::collections::HashSet;

use arrow::array::{Array, AsArray, BooleanArray};
use arrow::compute::{self, filter_record_batch, not};
use arrow::datatypes::{DataType, Int64Type};

use crate::types::KeySet;
use crate::utils::hasher::Xxh3Builder;
use crate::{Batch, IngestError, ValidationResult};

/// Two disjoint batches sharing the input schema. Together they hold every
/// input row exactly once, each side in input order.
#[derive(Debug, Clone)]
pub struct Partition {
    pub valid: Batch,
    pub invalid: Batch,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.valid.num_rows() + self.invalid.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `batch` on the natural keys reported by `result`.
///
/// A failing outcome that carries no keys (table-scoped, or an expectation
/// that could not run) cannot be traced to rows, so the whole batch is
/// considered invalid.
pub fn partition(batch: &Batch, result: &ValidationResult) -> Result<Partition, IngestError> {
    if !result.is_complete() {
        return Err(IngestError::MissingDiagnostics(result.suite_name.clone()));
    }
    let key_column = result.key_column.as_str();

    let keys = batch
        .column_by_name(key_column)
        .ok_or_else(|| IngestError::missing_column(key_column))?;
    let keys = match keys.data_type() {
        DataType::Int64 => keys.clone(),
        dt if dt.is_integer() => compute::cast(keys, &DataType::Int64)?,
        _ => return Err(IngestError::missing_column(key_column)),
    };
    let keys = keys.as_primitive::<Int64Type>();

    let mut whole_batch = false;
    let mut invalid_keys: KeySet = HashSet::with_hasher(Xxh3Builder);
    for outcome in result.failed_outcomes() {
        match &outcome.unexpected_keys {
            Some(offending) => invalid_keys.extend(offending.iter().copied()),
            None => whole_batch = true,
        }
    }

    let is_invalid: BooleanArray = if whole_batch {
        BooleanArray::from(vec![true; batch.num_rows()])
    } else {
        keys.iter()
            .map(|k| Some(k.is_some_and(|k| invalid_keys.contains(&k))))
            .collect()
    };

    Ok(Partition {
        valid: filter_record_batch(batch, &not(&is_invalid)?)?,
        invalid: filter_record_batch(batch, &is_invalid)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExpectationSuite, ResultFormat, validate};
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn products(ids: Vec<i64>, cost: Vec<f64>, price: Vec<f64>) -> Batch {
        let schema = Schema::new(vec![
            Field::new("product_id", DataType::Int64, true),
            Field::new("unit_cost_usd", DataType::Float64, true),
            Field::new("unit_price_usd", DataType::Float64, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(Float64Array::from(cost)),
                Arc::new(Float64Array::from(price)),
            ],
        )
        .unwrap()
    }

    fn suite() -> ExpectationSuite {
        let mut suite = ExpectationSuite::new("product expectations", "product_id");
        suite
            .values_between("unit_price_usd", Some(1.0), None)
            .unwrap()
            .pair_a_greater_than_b("unit_price_usd", "unit_cost_usd", false);
        suite
    }

    fn ids(batch: &Batch) -> Vec<i64> {
        batch
            .column(0)
            .as_primitive::<Int64Type>()
            .values()
            .to_vec()
    }

    #[test]
    fn test_partition_splits_on_keys() {
        let batch = products(
            vec![2486, 1934, 2133, 1234],
            vec![183.95, 913.42, 0.62, 0.56],
            vec![400.0, 499.09, 0.26, 0.99],
        );
        let result = validate(&batch, &suite(), ResultFormat::Complete).unwrap();
        let split = partition(&batch, &result).unwrap();

        assert_eq!(ids(&split.valid), vec![2486]);
        assert_eq!(ids(&split.invalid), vec![1934, 2133, 1234]);
        assert_eq!(split.len(), batch.num_rows());
        assert_eq!(split.valid.schema(), batch.schema());
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let batch = products(
            vec![5, 4, 3, 2, 1],
            vec![1.0, 9.0, 1.0, 9.0, 1.0],
            vec![2.0, 2.0, 2.0, 2.0, 0.5],
        );
        let result = validate(&batch, &suite(), ResultFormat::Complete).unwrap();
        let split = partition(&batch, &result).unwrap();

        let valid = ids(&split.valid);
        let invalid = ids(&split.invalid);
        assert!(valid.iter().all(|k| !invalid.contains(k)));
        let mut all: Vec<i64> = valid.into_iter().chain(invalid).collect();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_passing_result_keeps_everything() {
        let batch = products(vec![1, 2], vec![1.0, 1.0], vec![2.0, 3.0]);
        let result = validate(&batch, &suite(), ResultFormat::Complete).unwrap();
        let split = partition(&batch, &result).unwrap();
        assert_eq!(split.valid.num_rows(), 2);
        assert_eq!(split.invalid.num_rows(), 0);
    }

    #[test]
    fn test_summary_result_is_rejected() {
        let batch = products(vec![1], vec![1.0], vec![2.0]);
        let result = validate(&batch, &suite(), ResultFormat::Summary).unwrap();
        assert!(matches!(
            partition(&batch, &result),
            Err(IngestError::MissingDiagnostics(_))
        ));
    }

    #[test]
    fn test_table_scoped_failure_invalidates_batch() {
        let batch = products(vec![1, 2], vec![1.0, 1.0], vec![2.0, 3.0]);
        let mut suite = suite();
        suite.columns_match_ordered_list(&["product_id"]);
        let result = validate(&batch, &suite, ResultFormat::Complete).unwrap();
        let split = partition(&batch, &result).unwrap();
        assert_eq!(split.valid.num_rows(), 0);
        assert_eq!(split.invalid.num_rows(), 2);
    }

    #[test]
    fn test_missing_key_column() {
        let batch = products(vec![1], vec![1.0], vec![2.0]);
        let result = validate(&batch, &suite(), ResultFormat::Complete).unwrap();
        let other = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, true)])),
            vec![Arc::new(StringArray::from(vec!["a"]))],
        )
        .unwrap();
        assert!(matches!(
            partition(&other, &result),
            Err(IngestError::SchemaMismatch { .. })
        ));
    }
}
