//! Built-in expectation suites, one per record type.

use super::{ExpectationSuite, ValueType};
use crate::cleaner::rules::COUNTRY_CODES;
use crate::{IngestError, RecordType};

pub const ZIP_PATTERN: &str = r"^[0-9A-Za-z][0-9A-Za-z -]*$";

pub fn customers() -> Result<ExpectationSuite, IngestError> {
    let mut codes: Vec<&str> = COUNTRY_CODES.iter().map(|(_, code)| *code).collect();
    codes.sort_unstable();

    let mut suite = ExpectationSuite::new("customer expectations", "customer_id");
    suite
        .columns_match_ordered_list(RecordType::Customer.columns())
        .values_of_type("customer_id", ValueType::Int);
    for column in ["name", "city", "state", "zip"] {
        suite.values_of_type(column, ValueType::Str);
    }
    suite
        .values_of_type("dob", ValueType::Date)
        .values_not_null("zip")
        .values_match_regex("zip", ZIP_PATTERN)?
        .values_in_set("country", &codes)
        .values_unique("customer_id");
    Ok(suite)
}

pub fn products() -> Result<ExpectationSuite, IngestError> {
    let mut suite = ExpectationSuite::new("product expectations", "product_id");
    suite
        .columns_match_ordered_list(RecordType::Product.columns())
        .values_between("unit_price_usd", Some(1.0), None)?
        .pair_a_greater_than_b("unit_price_usd", "unit_cost_usd", false)
        .values_unique("product_id");
    Ok(suite)
}

pub fn product_categories() -> Result<ExpectationSuite, IngestError> {
    let mut suite = ExpectationSuite::new("product category expectations", "product_category_id");
    suite
        .columns_match_ordered_list(RecordType::ProductCategory.columns())
        .values_unique("product_category_id");
    Ok(suite)
}

pub fn product_subcategories() -> Result<ExpectationSuite, IngestError> {
    let mut suite = ExpectationSuite::new(
        "product subcategory expectations",
        "product_subcategory_id",
    );
    suite
        .columns_match_ordered_list(RecordType::ProductSubcategory.columns())
        .values_unique("product_subcategory_id");
    Ok(suite)
}
