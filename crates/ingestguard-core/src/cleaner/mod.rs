//! Raw record cleaning.
//!
//! Cleaning is table driven: a [`CleaningRules`] lists, in output order, which
//! raw column feeds each canonical column and how its values are converted.
//! Columns not named by the rules are dropped.

pub mod rules;
pub mod transforms;

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::datatypes::{Field, Schema};
use arrow::row::{RowConverter, SortField};
use arrow::record_batch::RecordBatch;

use crate::utils::hasher::Xxh3Builder;
use crate::{Batch, IngestError};

pub use rules::{CleaningRules, FieldRule, country_code};
pub use transforms::{FieldTransform, parse_currency, title_case};

/// The three tables derived from one raw product batch.
#[derive(Debug, Clone)]
pub struct ProductTables {
    pub products: Batch,
    pub categories: Batch,
    pub subcategories: Batch,
}

/// Apply a rule table to a raw batch. The input batch is left untouched.
pub fn clean(raw: &Batch, rules: &CleaningRules) -> Result<Batch, IngestError> {
    let missing: Vec<String> = rules
        .sources()
        .filter(|source| raw.column_by_name(source).is_none())
        .map(String::from)
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::SchemaMismatch { missing });
    }

    let mut fields = Vec::with_capacity(rules.fields.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(rules.fields.len());
    for rule in rules.fields {
        let raw_column = raw
            .column_by_name(rule.source)
            .ok_or_else(|| IngestError::missing_column(rule.source))?;
        let converted = rule.transform.apply(raw_column, rule.source)?;
        if rule.target == rules.key && converted.null_count() > 0 {
            let row = (0..converted.len())
                .find(|i| converted.is_null(*i))
                .unwrap_or_default();
            return Err(IngestError::InvalidValue {
                column: rule.source.to_string(),
                row,
                value: String::new(),
            });
        }
        fields.push(Field::new(rule.target, rule.transform.output_type(), true));
        columns.push(converted);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Clean a raw customer export into the 7 canonical customer columns.
pub fn clean_customer_data(raw: &Batch) -> Result<Batch, IngestError> {
    clean(raw, &rules::CUSTOMER_RULES)
}

/// Clean a raw product export into products, categories and subcategories.
pub fn clean_product_data(raw: &Batch) -> Result<ProductTables, IngestError> {
    let staged = clean(raw, &rules::PRODUCT_STAGING_RULES)?;

    let products = project(&staged, &rules::PRODUCT_COLUMNS)?;
    let categories = rename(
        &distinct_rows(&project(
            &staged,
            &["product_category_id", "product_category_name"],
        )?)?,
        &rules::CATEGORY_COLUMNS,
    )?;
    let subcategories = rename(
        &distinct_rows(&project(
            &staged,
            &["product_subcategory_id", "product_subcategory_name"],
        )?)?,
        &rules::SUBCATEGORY_COLUMNS,
    )?;

    Ok(ProductTables {
        products,
        categories,
        subcategories,
    })
}

/// Keep the named columns, in the given order.
pub fn project(batch: &Batch, columns: &[&str]) -> Result<Batch, IngestError> {
    let schema = batch.schema();
    let mut indices = Vec::with_capacity(columns.len());
    let mut missing = Vec::new();
    for name in columns {
        match schema.index_of(name) {
            Ok(idx) => indices.push(idx),
            Err(_) => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(IngestError::SchemaMismatch { missing });
    }
    Ok(batch.project(&indices)?)
}

/// Drop repeated rows, keeping the first occurrence of each.
pub fn distinct_rows(batch: &Batch) -> Result<Batch, IngestError> {
    let converter = RowConverter::new(
        batch
            .schema()
            .fields()
            .iter()
            .map(|f| SortField::new(f.data_type().clone()))
            .collect(),
    )?;
    let rows = converter.convert_columns(batch.columns())?;

    let mut seen = HashSet::with_hasher(Xxh3Builder);
    let indices = UInt32Array::from_iter_values(
        (0..rows.num_rows())
            .filter(|i| seen.insert(rows.row(*i)))
            .map(|i| i as u32),
    );
    Ok(take_record_batch(batch, &indices)?)
}

fn rename(batch: &Batch, names: &[&str]) -> Result<Batch, IngestError> {
    let fields: Vec<Field> = batch
        .schema()
        .fields()
        .iter()
        .zip(names)
        .map(|(field, name)| field.as_ref().clone().with_name(*name))
        .collect();
    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        batch.columns().to_vec(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_csv_str;
    use arrow::array::{AsArray, Float64Array};
    use arrow::datatypes::{DataType, Float64Type, Int64Type};

    const CUSTOMERS: &str = "CustomerKey,Gender,Name,City,State Code,State,Zip Code,Country,Continent,Birthday\n\
        1693133,Male,Samuel Hall,Norcross,GA,Georgia,30091,United States,North America,11/19/1976\n\
        887837,Female,Ileen van Dael,Utrecht,UT,Utrecht,3532 XR,Netherlands,Europe,9/15/1983\n";

    const PRODUCTS: &str = "ProductKey,Product Name,Brand,Color,Unit Cost USD,Unit Price USD,SubcategoryKey,Subcategory,CategoryKey,Category\n\
        1,Contoso 512MB MP3 Player E51 Silver,Contoso,Silver,$6.62 ,$12.99 ,0101,MP4&MP3,01,Audio\n\
        374,Adventure Works Laptop19W X1980 Silver,Adventure Works,Silver,$430.38 ,\"$1,299.00 \",0301,Laptops,03,Computers\n\
        657,Proseware Duplex Scanner M200 Black,Proseware,Black,$68.52 ,$149.00 ,0306,\"Printers, Scanners & Fax\",03,Computers\n";

    #[test]
    fn test_clean_customers_shape_and_order() {
        let raw = read_csv_str(CUSTOMERS).unwrap();
        let cleaned = clean_customer_data(&raw).unwrap();

        assert_eq!(cleaned.num_rows(), 2);
        assert_eq!(cleaned.num_columns(), 7);
        let names: Vec<String> = cleaned
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(
            names,
            vec!["customer_id", "name", "dob", "city", "state", "zip", "country"]
        );
        assert_eq!(cleaned.column(0).null_count(), 0);
        assert_eq!(cleaned.column(0).data_type(), &DataType::Int64);
        assert_eq!(cleaned.column(2).data_type(), &DataType::Date32);

        let country = cleaned.column(6).as_string::<i32>();
        assert_eq!(country.value(0), "US");
        assert_eq!(country.value(1), "NL");
    }

    #[test]
    fn test_clean_leaves_input_untouched() {
        let raw = read_csv_str(CUSTOMERS).unwrap();
        let before = raw.clone();
        let _ = clean_customer_data(&raw).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn test_clean_customers_title_cases_city() {
        let raw = read_csv_str(
            "CustomerKey,Name,City,State Code,Zip Code,Country,Birthday\n\
             1,A,NEW YORK,NY,10123,United States,11/2/1966\n",
        )
        .unwrap();
        let cleaned = clean_customer_data(&raw).unwrap();
        assert_eq!(cleaned.column(3).as_string::<i32>().value(0), "New York");
    }

    #[test]
    fn test_unknown_country() {
        let raw = read_csv_str(
            "CustomerKey,Name,City,State Code,Zip Code,Country,Birthday\n\
             1,A,Paris,PA,75001,Atlantis,11/2/1966\n",
        )
        .unwrap();
        match clean_customer_data(&raw) {
            Err(IngestError::UnknownCategory { column, value }) => {
                assert_eq!(column, "Country");
                assert_eq!(value, "Atlantis");
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_country_is_unknown() {
        let raw = read_csv_str(
            "CustomerKey,Name,City,State Code,Zip Code,Country,Birthday\n\
             1,A,Paris,PA,75001,France,11/2/1966\n\
             2,B,Lyon,RH,69001,,1/2/1970\n",
        )
        .unwrap();
        assert!(raw.column(5).is_null(1));
        match clean_customer_data(&raw) {
            Err(IngestError::UnknownCategory { column, value }) => {
                assert_eq!(column, "Country");
                assert_eq!(value, "");
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_columns_are_all_listed() {
        let raw = read_csv_str("CustomerKey,Name\n1,A\n").unwrap();
        match clean_customer_data(&raw) {
            Err(IngestError::SchemaMismatch { missing }) => {
                assert_eq!(
                    missing,
                    vec!["Birthday", "City", "State Code", "Zip Code", "Country"]
                );
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_null_key_is_rejected() {
        let raw = read_csv_str(
            "CustomerKey,Name,City,State Code,Zip Code,Country,Birthday\n\
             1,A,Paris,PA,75001,France,11/2/1966\n\
             ,B,Lyon,RH,69001,France,1/2/1970\n",
        )
        .unwrap();
        match clean_customer_data(&raw) {
            Err(IngestError::InvalidValue { column, row, .. }) => {
                assert_eq!(column, "CustomerKey");
                assert_eq!(row, 1);
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_products() {
        let raw = read_csv_str(PRODUCTS).unwrap();
        let tables = clean_product_data(&raw).unwrap();

        assert_eq!(tables.products.num_rows(), 3);
        assert_eq!(tables.products.num_columns(), 8);
        let price = tables
            .products
            .column_by_name("unit_price_usd")
            .unwrap()
            .as_primitive::<Float64Type>();
        assert_eq!(price, &Float64Array::from(vec![12.99, 1299.0, 149.0]));

        let category_ids = tables.categories.column(0).as_primitive::<Int64Type>();
        assert_eq!(category_ids.values().to_vec(), vec![1, 3]);
        assert_eq!(tables.categories.schema().field(1).name(), "name");

        let subcategory_ids = tables.subcategories.column(0).as_primitive::<Int64Type>();
        assert_eq!(subcategory_ids.values().to_vec(), vec![101, 301, 306]);
        let names = tables.subcategories.column(1).as_string::<i32>();
        assert_eq!(names.value(2), "Printers, Scanners & Fax");
    }

    #[test]
    fn test_distinct_rows_keeps_first_seen_order() {
        let raw = read_csv_str("id,name\n3,c\n1,a\n3,c\n2,b\n1,a\n").unwrap();
        let distinct = distinct_rows(&raw).unwrap();
        let ids = distinct.column(0).as_string::<i32>();
        assert_eq!(ids.iter().flatten().collect::<Vec<_>>(), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_project_unknown_column() {
        let raw = read_csv_str("a,b\n1,2\n").unwrap();
        assert!(matches!(
            project(&raw, &["b", "z"]),
            Err(IngestError::SchemaMismatch { .. })
        ));
    }
}
