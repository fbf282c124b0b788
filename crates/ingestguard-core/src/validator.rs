//! Validation runner: evaluates an [`ExpectationSuite`] against a batch.
//!
//! Expectations are independent of each other and run in declaration order.
//! In [`ResultFormat::Complete`] mode, failing row-scoped expectations also
//! report the natural keys of the offending rows, read from the suite's key
//! column. Keys are left out when that column is missing, not castable to an
//! integer, or null on an offending row.

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Int64Array};
use arrow::compute;
use arrow::datatypes::{DataType, Float64Type, Int64Type};

use crate::rules::{
    IsInCheck, NullCheck, PairCompare, Range, RegexMatch, TypeCheck, UnicityCheck, flagged_rows,
};
use crate::utils::operator::CompOperator;
use crate::{
    Batch, Expectation, ExpectationOutcome, ExpectationSuite, IngestError, ResultFormat,
    ValidationResult,
};

enum Evaluation {
    /// Table-scoped expectation, already reduced to counts
    Table { elements: usize, unexpected: usize },
    /// Row-scoped expectation, one flag per row
    Rows(BooleanArray),
    /// Expectation could not be evaluated
    Exception(String),
}

/// Run every expectation of `suite` against `batch`. The batch is not modified.
pub fn validate(
    batch: &Batch,
    suite: &ExpectationSuite,
    format: ResultFormat,
) -> Result<ValidationResult, IngestError> {
    let total_rows = batch.num_rows();
    let mut result = ValidationResult::new(
        suite.name().to_string(),
        suite.key_column().to_string(),
        total_rows,
        format,
    );
    let keys = match format {
        ResultFormat::Complete => key_values(batch, suite.key_column()),
        ResultFormat::Summary => None,
    };

    for expectation in suite.expectations() {
        let outcome = match evaluate(batch, expectation)? {
            Evaluation::Table {
                elements,
                unexpected,
            } => ExpectationOutcome::new(expectation.clone(), elements, unexpected),
            Evaluation::Rows(mask) => {
                let rows = flagged_rows(&mask);
                let outcome = ExpectationOutcome::new(expectation.clone(), total_rows, rows.len());
                match keys.as_ref().and_then(|k| keys_for_rows(k, &rows)) {
                    Some(offending) => outcome.with_keys(offending),
                    None => outcome,
                }
            }
            Evaluation::Exception(message) => {
                ExpectationOutcome::exception(expectation.clone(), total_rows, message)
            }
        };
        result.add_outcome(outcome);
    }
    Ok(result)
}

fn evaluate(batch: &Batch, expectation: &Expectation) -> Result<Evaluation, IngestError> {
    let mut arrays = Vec::with_capacity(2);
    for column in expectation.columns() {
        match batch.column_by_name(column) {
            Some(array) => arrays.push(array.clone()),
            None => {
                return Ok(Evaluation::Exception(format!(
                    "column '{}' not found in batch",
                    column
                )));
            }
        }
    }

    let mask = match expectation {
        Expectation::ColumnsMatchOrderedList { columns } => {
            return Ok(match_ordered_list(batch, columns));
        }
        Expectation::ColumnValuesOfType { value_type, .. } => {
            TypeCheck::new(value_type.data_type()).validate(&arrays[0])?
        }
        Expectation::ColumnValuesInSet { values, .. } => {
            IsInCheck::new(values.as_slice()).validate(&as_text(&arrays[0])?)
        }
        Expectation::ColumnValuesBetween { column, min, max } => {
            if !arrays[0].data_type().is_numeric() {
                return Ok(Evaluation::Exception(format!(
                    "column '{}' is not numeric ({})",
                    column,
                    arrays[0].data_type()
                )));
            }
            let values = compute::cast(&arrays[0], &DataType::Float64)?;
            Range::new(*min, *max).validate(values.as_primitive::<Float64Type>())
        }
        Expectation::ColumnPairAGreaterThanB { or_equal, .. } => {
            let operator = CompOperator::or_equal(*or_equal);
            match PairCompare::new(operator).validate(&arrays[0], &arrays[1]) {
                Ok(mask) => mask,
                Err(IngestError::InvalidExpectation(message)) => {
                    return Ok(Evaluation::Exception(message));
                }
                Err(e) => return Err(e),
            }
        }
        Expectation::ColumnValuesMatchRegex { pattern, .. } => {
            RegexMatch::new(pattern.clone()).validate(&as_text(&arrays[0])?)?
        }
        Expectation::ColumnValuesNotNull { .. } => NullCheck::new().validate(&arrays[0])?,
        Expectation::ColumnValuesUnique { .. } => UnicityCheck::new().validate(&arrays[0])?,
    };
    Ok(Evaluation::Rows(mask))
}

fn match_ordered_list(batch: &Batch, columns: &[String]) -> Evaluation {
    let schema = batch.schema();
    let observed: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    let width = observed.len().max(columns.len());
    let unexpected = (0..width)
        .filter(|i| observed.get(*i).copied() != columns.get(*i).map(String::as_str))
        .count();
    Evaluation::Table {
        elements: columns.len(),
        unexpected,
    }
}

fn as_text(array: &ArrayRef) -> Result<arrow::array::StringArray, IngestError> {
    let text = compute::cast(array, &DataType::Utf8)?;
    Ok(text.as_string::<i32>().clone())
}

/// Natural key column as integers, if it can be attributed at all.
fn key_values(batch: &Batch, key_column: &str) -> Option<Int64Array> {
    let column = batch.column_by_name(key_column)?;
    let casted = compute::cast(column, &DataType::Int64).ok()?;
    Some(casted.as_primitive::<Int64Type>().clone())
}

fn keys_for_rows(keys: &Int64Array, rows: &[usize]) -> Option<Vec<i64>> {
    rows.iter()
        .map(|i| (!keys.is_null(*i)).then(|| keys.value(*i)))
        .collect()
}
