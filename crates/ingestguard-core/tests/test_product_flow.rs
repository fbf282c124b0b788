use arrow::array::AsArray;
use arrow::datatypes::Int64Type;
use ingestguard_core::{
    Batch, RecordType, ResultFormat, clean_product_data, partition, read_csv_str, validate,
    write_invalid_rows,
};
use tempfile::tempdir;

const PRODUCTS: &str = "ProductKey,Product Name,Brand,Color,Unit Cost USD,Unit Price USD,SubcategoryKey,Subcategory,CategoryKey,Category
1,Contoso 512MB MP3 Player E51 Silver,Contoso,Silver,$6.62 ,$12.99 ,0101,MP4&MP3,01,Audio
374,Adventure Works Laptop19W X1980 Silver,Adventure Works,Silver,$430.38 ,\"$1,299.00 \",0301,Laptops,03,Computers
1934,Fabrikam Refrigerator 19CuFt M7600 Orange,Fabrikam,Orange,$913.42 ,$499.09 ,0802,Refrigerators,08,Home Appliances
";

fn ids(batch: &Batch) -> Vec<i64> {
    batch
        .column(0)
        .as_primitive::<Int64Type>()
        .values()
        .to_vec()
}

#[test]
fn test_price_below_cost_is_split_off() {
    let tables = clean_product_data(&read_csv_str(PRODUCTS).unwrap()).unwrap();

    for (record_type, batch) in [
        (RecordType::ProductCategory, &tables.categories),
        (RecordType::ProductSubcategory, &tables.subcategories),
    ] {
        let suite = record_type.suite().unwrap();
        let result = validate(batch, &suite, ResultFormat::Complete).unwrap();
        assert!(result.is_passed(), "{} failed", record_type);
    }

    let suite = RecordType::Product.suite().unwrap();
    let result = validate(&tables.products, &suite, ResultFormat::Complete).unwrap();
    assert!(!result.is_passed());
    assert_eq!(
        result.failed_expectations(),
        vec!["unit_price_usd > unit_cost_usd"]
    );

    let split = partition(&tables.products, &result).unwrap();
    assert_eq!(ids(&split.valid), vec![1, 374]);
    assert_eq!(ids(&split.invalid), vec![1934]);

    let dir = tempdir().unwrap();
    let path = write_invalid_rows(dir.path(), "products", &split.invalid).unwrap();
    let content = std::fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "product_id,name,brand,color,unit_cost_usd,unit_price_usd,product_category_id,product_subcategory_id"
    );
    assert!(lines.next().unwrap().starts_with("1934,Fabrikam Refrigerator"));
    assert!(lines.next().is_none());
}

#[test]
fn test_category_tables_are_distinct() {
    let tables = clean_product_data(&read_csv_str(PRODUCTS).unwrap()).unwrap();
    assert_eq!(ids(&tables.categories), vec![1, 3, 8]);
    assert_eq!(ids(&tables.subcategories), vec![101, 301, 802]);
    let names = tables.categories.column(1).as_string::<i32>();
    assert_eq!(names.value(2), "Home Appliances");
}
