use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::transforms::FieldTransform;

/// One raw field renamed to its canonical name and converted.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub source: &'static str,
    pub target: &'static str,
    pub transform: FieldTransform,
}

impl FieldRule {
    pub const fn new(source: &'static str, target: &'static str, transform: FieldTransform) -> Self {
        Self {
            source,
            target,
            transform,
        }
    }
}

/// Fixed cleaning table. Output columns follow the order of `fields`, every
/// raw column not listed is dropped. `key` names the canonical natural key,
/// which may not be null once cleaned.
#[derive(Debug, Clone, Copy)]
pub struct CleaningRules {
    pub key: &'static str,
    pub fields: &'static [FieldRule],
}

impl CleaningRules {
    pub fn sources(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.source)
    }

    pub fn targets(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.target).collect()
    }
}

pub const BIRTHDAY_FORMAT: &str = "%m/%d/%Y";

pub static CUSTOMER_RULES: CleaningRules = CleaningRules {
    key: "customer_id",
    fields: &[
        FieldRule::new("CustomerKey", "customer_id", FieldTransform::Integer),
        FieldRule::new("Name", "name", FieldTransform::Text),
        FieldRule::new("Birthday", "dob", FieldTransform::Date(BIRTHDAY_FORMAT)),
        FieldRule::new("City", "city", FieldTransform::TitleCase),
        FieldRule::new("State Code", "state", FieldTransform::Text),
        FieldRule::new("Zip Code", "zip", FieldTransform::Text),
        FieldRule::new("Country", "country", FieldTransform::Lookup(country_code)),
    ],
};

/// Every raw product column renamed and typed. The product, category and
/// subcategory tables are projections of this staging batch.
pub static PRODUCT_STAGING_RULES: CleaningRules = CleaningRules {
    key: "product_id",
    fields: &[
        FieldRule::new("ProductKey", "product_id", FieldTransform::Integer),
        FieldRule::new("Product Name", "name", FieldTransform::Text),
        FieldRule::new("Brand", "brand", FieldTransform::Text),
        FieldRule::new("Color", "color", FieldTransform::Text),
        FieldRule::new("Unit Cost USD", "unit_cost_usd", FieldTransform::Currency),
        FieldRule::new("Unit Price USD", "unit_price_usd", FieldTransform::Currency),
        FieldRule::new("SubcategoryKey", "product_subcategory_id", FieldTransform::Integer),
        FieldRule::new("Subcategory", "product_subcategory_name", FieldTransform::Text),
        FieldRule::new("CategoryKey", "product_category_id", FieldTransform::Integer),
        FieldRule::new("Category", "product_category_name", FieldTransform::Text),
    ],
};

pub const CUSTOMER_COLUMNS: [&str; 7] = [
    "customer_id",
    "name",
    "dob",
    "city",
    "state",
    "zip",
    "country",
];

pub const CATEGORY_COLUMNS: [&str; 2] = ["product_category_id", "name"];

pub const SUBCATEGORY_COLUMNS: [&str; 2] = ["product_subcategory_id", "name"];

pub const PRODUCT_COLUMNS: [&str; 8] = [
    "product_id",
    "name",
    "brand",
    "color",
    "unit_cost_usd",
    "unit_price_usd",
    "product_category_id",
    "product_subcategory_id",
];

pub const COUNTRY_CODES: [(&str, &str); 8] = [
    ("Australia", "AU"),
    ("Canada", "CA"),
    ("Germany", "DE"),
    ("France", "FR"),
    ("Italy", "IT"),
    ("Netherlands", "NL"),
    ("United Kingdom", "GB"),
    ("United States", "US"),
];

static COUNTRY_LOOKUP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| COUNTRY_CODES.into_iter().collect());

/// Exact-match country name to ISO code.
pub fn country_code(name: &str) -> Option<&'static str> {
    COUNTRY_LOOKUP.get(name).copied()
}
