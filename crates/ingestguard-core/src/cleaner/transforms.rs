use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, Date32Array, Float64Array, Int64Array, StringArray,
};
use arrow::compute;
use arrow::datatypes::{DataType, Date32Type};
use chrono::NaiveDate;

use crate::IngestError;

/// Per-field value conversion applied while cleaning.
#[derive(Debug, Clone, Copy)]
pub enum FieldTransform {
    /// Integer identifier, e.g. `"0101"` becomes `101`
    Integer,
    /// Free text kept as is
    Text,
    /// Free text title-cased, e.g. city names
    TitleCase,
    /// Currency string such as `"$1,299.00 "` parsed to a float
    Currency,
    /// Exact-match category lookup
    Lookup(fn(&str) -> Option<&'static str>),
    /// Date string parsed with a chrono format
    Date(&'static str),
}

impl FieldTransform {
    pub fn output_type(&self) -> DataType {
        match self {
            FieldTransform::Integer => DataType::Int64,
            FieldTransform::Currency => DataType::Float64,
            FieldTransform::Date(_) => DataType::Date32,
            FieldTransform::Text | FieldTransform::TitleCase | FieldTransform::Lookup(_) => {
                DataType::Utf8
            }
        }
    }

    /// Convert one column. Nulls stay null, except for lookups which require
    /// a known value.
    pub fn apply(&self, array: &ArrayRef, column: &str) -> Result<ArrayRef, IngestError> {
        match self {
            FieldTransform::Integer => to_integer(array, column),
            FieldTransform::Text => Ok(Arc::new(to_text(array)?)),
            FieldTransform::TitleCase => {
                let text = to_text(array)?;
                let cased: StringArray = text.iter().map(|v| v.map(title_case)).collect();
                Ok(Arc::new(cased))
            }
            FieldTransform::Currency => to_currency(array, column),
            FieldTransform::Lookup(lookup) => {
                let text = to_text(array)?;
                let mapped = text
                    .iter()
                    .map(|v| {
                        // an empty field has no category either
                        let value = v.unwrap_or_default();
                        lookup(value).map(Some).ok_or_else(|| IngestError::UnknownCategory {
                            column: column.to_string(),
                            value: value.to_string(),
                        })
                    })
                    .collect::<Result<StringArray, _>>()?;
                Ok(Arc::new(mapped))
            }
            FieldTransform::Date(format) => to_date(array, column, format),
        }
    }
}

/// Strip currency symbol, thousands separators and padding, then parse.
pub fn parse_currency(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok()
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_alpha = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if previous_is_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_alpha = true;
        } else {
            out.push(c);
            previous_is_alpha = false;
        }
    }
    out
}

fn to_text(array: &ArrayRef) -> Result<StringArray, IngestError> {
    let casted = compute::cast(array, &DataType::Utf8)?;
    Ok(casted.as_string::<i32>().clone())
}

fn to_integer(array: &ArrayRef, column: &str) -> Result<ArrayRef, IngestError> {
    if array.data_type() == &DataType::Int64 {
        return Ok(array.clone());
    }
    let text = to_text(array)?;
    let parsed = text
        .iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(value) => value
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid(column, row, value)),
            None => Ok(None),
        })
        .collect::<Result<Int64Array, _>>()?;
    Ok(Arc::new(parsed))
}

fn to_currency(array: &ArrayRef, column: &str) -> Result<ArrayRef, IngestError> {
    match array.data_type() {
        DataType::Float64 => Ok(array.clone()),
        DataType::Int64 | DataType::Int32 | DataType::Float32 => {
            Ok(compute::cast(array, &DataType::Float64)?)
        }
        _ => {
            let text = to_text(array)?;
            let parsed = text
                .iter()
                .enumerate()
                .map(|(row, v)| match v {
                    Some(value) => parse_currency(value)
                        .map(Some)
                        .ok_or_else(|| invalid(column, row, value)),
                    None => Ok(None),
                })
                .collect::<Result<Float64Array, _>>()?;
            Ok(Arc::new(parsed))
        }
    }
}

fn to_date(array: &ArrayRef, column: &str, format: &str) -> Result<ArrayRef, IngestError> {
    if array.data_type() == &DataType::Date32 {
        return Ok(array.clone());
    }
    let text = to_text(array)?;
    let parsed = text
        .iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(value) => NaiveDate::parse_from_str(value.trim(), format)
                .map(|date| Some(Date32Type::from_naive_date(date)))
                .map_err(|_| invalid(column, row, value)),
            None => Ok(None),
        })
        .collect::<Result<Date32Array, _>>()?;
    Ok(Arc::new(parsed))
}

fn invalid(column: &str, row: usize, value: &str) -> IngestError {
    IngestError::InvalidValue {
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}
