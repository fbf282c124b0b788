use std::fmt;
use std::str::FromStr;

use crate::IngestError;
use crate::cleaner::rules::{
    CATEGORY_COLUMNS, CUSTOMER_COLUMNS, PRODUCT_COLUMNS, SUBCATEGORY_COLUMNS,
};
use crate::expectations::{ExpectationSuite, suites};

/// What a failed validation does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Any failure aborts the run before persistence
    HardFail,
    /// Failing rows are split off, the valid rows are persisted
    SoftFail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Customer,
    Product,
    ProductCategory,
    ProductSubcategory,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [
        RecordType::Customer,
        RecordType::Product,
        RecordType::ProductCategory,
        RecordType::ProductSubcategory,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            RecordType::Customer => "customers",
            RecordType::Product => "products",
            RecordType::ProductCategory => "product_category",
            RecordType::ProductSubcategory => "product_subcategory",
        }
    }

    pub fn key_column(&self) -> &'static str {
        match self {
            RecordType::Customer => "customer_id",
            RecordType::Product => "product_id",
            RecordType::ProductCategory => "product_category_id",
            RecordType::ProductSubcategory => "product_subcategory_id",
        }
    }

    /// Canonical columns of the cleaned table, in order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            RecordType::Customer => &CUSTOMER_COLUMNS,
            RecordType::Product => &PRODUCT_COLUMNS,
            RecordType::ProductCategory => &CATEGORY_COLUMNS,
            RecordType::ProductSubcategory => &SUBCATEGORY_COLUMNS,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RecordType::Product => Severity::SoftFail,
            _ => Severity::HardFail,
        }
    }

    /// Fresh expectation suite for this record type.
    pub fn suite(&self) -> Result<ExpectationSuite, IngestError> {
        match self {
            RecordType::Customer => suites::customers(),
            RecordType::Product => suites::products(),
            RecordType::ProductCategory => suites::product_categories(),
            RecordType::ProductSubcategory => suites::product_subcategories(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for RecordType {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "customer" | "customers" => Ok(RecordType::Customer),
            "product" | "products" => Ok(RecordType::Product),
            "product_category" | "product_categories" | "category" | "categories" => {
                Ok(RecordType::ProductCategory)
            }
            "product_subcategory" | "product_subcategories" | "subcategory" | "subcategories" => {
                Ok(RecordType::ProductSubcategory)
            }
            other => Err(IngestError::InvalidExpectation(format!(
                "unknown record type '{}'",
                other
            ))),
        }
    }
}
