pub mod suites;

use std::fmt;

use arrow::datatypes::DataType;
use regex::Regex;

use crate::IngestError;
use crate::utils::operator::CompOperator;

/// Value type a column is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Float,
    Str,
    Date,
}

impl ValueType {
    pub fn data_type(&self) -> DataType {
        match self {
            ValueType::Int => DataType::Int64,
            ValueType::Float => DataType::Float64,
            ValueType::Str => DataType::Utf8,
            ValueType::Date => DataType::Date32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::Date => "date",
        }
    }
}

/// A single declarative constraint over a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Column names equal the list, in the same order
    ColumnsMatchOrderedList { columns: Vec<String> },
    ColumnValuesOfType {
        column: String,
        value_type: ValueType,
    },
    ColumnValuesInSet { column: String, values: Vec<String> },
    /// Inclusive bounds, either side optional
    ColumnValuesBetween {
        column: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    ColumnPairAGreaterThanB {
        column_a: String,
        column_b: String,
        or_equal: bool,
    },
    ColumnValuesMatchRegex { column: String, pattern: String },
    ColumnValuesNotNull { column: String },
    ColumnValuesUnique { column: String },
}

impl Expectation {
    pub fn name(&self) -> &'static str {
        match self {
            Expectation::ColumnsMatchOrderedList { .. } => "ColumnsMatchOrderedList",
            Expectation::ColumnValuesOfType { .. } => "ColumnValuesOfType",
            Expectation::ColumnValuesInSet { .. } => "ColumnValuesInSet",
            Expectation::ColumnValuesBetween { .. } => "ColumnValuesBetween",
            Expectation::ColumnPairAGreaterThanB { .. } => "ColumnPairAGreaterThanB",
            Expectation::ColumnValuesMatchRegex { .. } => "ColumnValuesMatchRegex",
            Expectation::ColumnValuesNotNull { .. } => "ColumnValuesNotNull",
            Expectation::ColumnValuesUnique { .. } => "ColumnValuesUnique",
        }
    }

    /// Columns the expectation reads. Empty for table-scoped expectations.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Expectation::ColumnsMatchOrderedList { .. } => Vec::new(),
            Expectation::ColumnPairAGreaterThanB {
                column_a, column_b, ..
            } => vec![column_a.as_str(), column_b.as_str()],
            Expectation::ColumnValuesOfType { column, .. }
            | Expectation::ColumnValuesInSet { column, .. }
            | Expectation::ColumnValuesBetween { column, .. }
            | Expectation::ColumnValuesMatchRegex { column, .. }
            | Expectation::ColumnValuesNotNull { column }
            | Expectation::ColumnValuesUnique { column } => vec![column.as_str()],
        }
    }

    /// Row-scoped expectations can name the rows that broke them.
    pub fn is_row_scoped(&self) -> bool {
        !matches!(self, Expectation::ColumnsMatchOrderedList { .. })
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::ColumnsMatchOrderedList { columns } => {
                write!(f, "columns = [{}]", columns.join(", "))
            }
            Expectation::ColumnValuesOfType { column, value_type } => {
                write!(f, "{} is {}", column, value_type.as_str())
            }
            Expectation::ColumnValuesInSet { column, values } => {
                write!(f, "{} in [{}]", column, values.join(", "))
            }
            Expectation::ColumnValuesBetween { column, min, max } => match (min, max) {
                (Some(min), Some(max)) => write!(f, "{} between {} and {}", column, min, max),
                (Some(min), None) => write!(f, "{} >= {}", column, min),
                (None, Some(max)) => write!(f, "{} <= {}", column, max),
                (None, None) => write!(f, "{} unbounded", column),
            },
            Expectation::ColumnPairAGreaterThanB {
                column_a,
                column_b,
                or_equal,
            } => {
                let op = CompOperator::or_equal(*or_equal);
                write!(f, "{} {} {}", column_a, op, column_b)
            }
            Expectation::ColumnValuesMatchRegex { column, pattern } => {
                write!(f, "{} matches /{}/", column, pattern)
            }
            Expectation::ColumnValuesNotNull { column } => write!(f, "{} not null", column),
            Expectation::ColumnValuesUnique { column } => write!(f, "{} unique", column),
        }
    }
}

/// Named, ordered set of expectations evaluated against one batch.
///
/// `key_column` is the natural key used to attribute failures to rows.
#[derive(Debug, Clone)]
pub struct ExpectationSuite {
    name: String,
    key_column: String,
    expectations: Vec<Expectation>,
}

impl ExpectationSuite {
    pub fn new(name: impl Into<String>, key_column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_column: key_column.into(),
            expectations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    pub fn add(&mut self, expectation: Expectation) -> &mut Self {
        self.expectations.push(expectation);
        self
    }

    pub fn columns_match_ordered_list(&mut self, columns: &[&str]) -> &mut Self {
        self.add(Expectation::ColumnsMatchOrderedList {
            columns: columns.iter().map(|c| c.to_string()).collect(),
        })
    }

    pub fn values_of_type(&mut self, column: &str, value_type: ValueType) -> &mut Self {
        self.add(Expectation::ColumnValuesOfType {
            column: column.to_string(),
            value_type,
        })
    }

    pub fn values_in_set(&mut self, column: &str, values: &[&str]) -> &mut Self {
        self.add(Expectation::ColumnValuesInSet {
            column: column.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn values_between(
        &mut self,
        column: &str,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<&mut Self, IngestError> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(IngestError::InvalidExpectation(format!(
                    "min {} is greater than max {} for column '{}'",
                    lo, hi, column
                )));
            }
        }
        Ok(self.add(Expectation::ColumnValuesBetween {
            column: column.to_string(),
            min,
            max,
        }))
    }

    pub fn pair_a_greater_than_b(
        &mut self,
        column_a: &str,
        column_b: &str,
        or_equal: bool,
    ) -> &mut Self {
        self.add(Expectation::ColumnPairAGreaterThanB {
            column_a: column_a.to_string(),
            column_b: column_b.to_string(),
            or_equal,
        })
    }

    pub fn values_match_regex(
        &mut self,
        column: &str,
        pattern: &str,
    ) -> Result<&mut Self, IngestError> {
        // Validate regex at build time
        Regex::new(pattern).map_err(|e| {
            IngestError::InvalidExpectation(format!("Invalid regex pattern '{}': {}", pattern, e))
        })?;
        Ok(self.add(Expectation::ColumnValuesMatchRegex {
            column: column.to_string(),
            pattern: pattern.to_string(),
        }))
    }

    pub fn values_not_null(&mut self, column: &str) -> &mut Self {
        self.add(Expectation::ColumnValuesNotNull {
            column: column.to_string(),
        })
    }

    pub fn values_unique(&mut self, column: &str) -> &mut Self {
        self.add(Expectation::ColumnValuesUnique {
            column: column.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_declaration_order() {
        let mut suite = ExpectationSuite::new("orders", "order_id");
        suite
            .columns_match_ordered_list(&["order_id", "total"])
            .values_of_type("order_id", ValueType::Int)
            .values_unique("order_id");
        let names: Vec<&str> = suite.expectations().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                "ColumnsMatchOrderedList",
                "ColumnValuesOfType",
                "ColumnValuesUnique"
            ]
        );
        assert_eq!(suite.key_column(), "order_id");
    }

    #[test]
    fn test_invalid_regex_rejected_at_build() {
        let mut suite = ExpectationSuite::new("orders", "order_id");
        let res = suite.values_match_regex("code", "[a-");
        assert!(matches!(res, Err(IngestError::InvalidExpectation(_))));
        assert!(suite.is_empty());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut suite = ExpectationSuite::new("orders", "order_id");
        assert!(suite.values_between("total", Some(10.0), Some(1.0)).is_err());
    }

    #[test]
    fn test_display() {
        let e = Expectation::ColumnPairAGreaterThanB {
            column_a: "unit_price_usd".to_string(),
            column_b: "unit_cost_usd".to_string(),
            or_equal: false,
        };
        assert_eq!(e.to_string(), "unit_price_usd > unit_cost_usd");
        assert_eq!(e.columns(), vec!["unit_price_usd", "unit_cost_usd"]);
        assert!(e.is_row_scoped());
    }
}
