use arrow::array::AsArray;
use arrow::datatypes::{DataType, Int64Type};
use ingestguard_core::{
    IngestError, RecordType, ResultFormat, clean_customer_data, partition, read_csv_batch,
    validate,
};
use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

const HEADER: &str =
    "CustomerKey,Gender,Name,City,State Code,State,Zip Code,Country,Continent,Birthday";

fn write_csv(rows: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("customers.csv");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    (dir, path)
}

#[test]
fn test_two_customers_clean_and_validate() {
    let (_dir, path) = write_csv(&[
        "1693133,Male,Samuel Hall,Norcross,GA,Georgia,30091,United States,North America,11/19/1976",
        "887837,Female,Ileen van Dael,Utrecht,UT,Utrecht,3532 XR,Netherlands,Europe,9/15/1983",
    ]);

    let raw = read_csv_batch(&path).unwrap();
    let cleaned = clean_customer_data(&raw).unwrap();
    assert_eq!((cleaned.num_rows(), cleaned.num_columns()), (2, 7));

    let country = cleaned.column_by_name("country").unwrap().as_string::<i32>();
    assert_eq!(country.value(0), "US");
    assert_eq!(country.value(1), "NL");

    let suite = RecordType::Customer.suite().unwrap();
    let result = validate(&cleaned, &suite, ResultFormat::Complete).unwrap();
    assert!(result.is_passed(), "{:?}", result.failed_expectations());
}

#[test]
fn test_duplicate_customer_keys_fail_validation() {
    let (_dir, path) = write_csv(&[
        "10,Male,A,Paris,PA,Paris,75001,France,Europe,1/1/1980",
        "10,Female,B,Lyon,RH,Rhone,69001,France,Europe,2/2/1982",
        "11,Female,C,Nice,PA,Paris,06000,France,Europe,3/3/1983",
    ]);
    let cleaned = clean_customer_data(&read_csv_batch(&path).unwrap()).unwrap();
    let suite = RecordType::Customer.suite().unwrap();
    let result = validate(&cleaned, &suite, ResultFormat::Complete).unwrap();

    assert!(!result.is_passed());
    let unique = result
        .outcomes()
        .iter()
        .find(|o| o.expectation.name() == "ColumnValuesUnique")
        .unwrap();
    assert_eq!(unique.unexpected_keys, Some(vec![10, 10]));

    let split = partition(&cleaned, &result).unwrap();
    let valid_ids = split.valid.column(0).as_primitive::<Int64Type>();
    assert_eq!(valid_ids.values().to_vec(), vec![11]);
    assert_eq!(split.invalid.num_rows(), 2);
}

#[test]
fn test_cleaned_customer_types() {
    let (_dir, path) = write_csv(&[
        "1,Male,A,new york,NY,New York,10123,United States,North America,11/2/1966",
    ]);
    let cleaned = clean_customer_data(&read_csv_batch(&path).unwrap()).unwrap();
    let types: Vec<DataType> = cleaned
        .schema()
        .fields()
        .iter()
        .map(|f| f.data_type().clone())
        .collect();
    assert_eq!(
        types,
        vec![
            DataType::Int64,
            DataType::Utf8,
            DataType::Date32,
            DataType::Utf8,
            DataType::Utf8,
            DataType::Utf8,
            DataType::Utf8,
        ]
    );
}

#[test]
fn test_unmapped_country_aborts_cleaning() {
    let (_dir, path) = write_csv(&["1,Male,A,Oslo,OS,Oslo,0150,Norway,Europe,1/1/1980"]);
    let err = clean_customer_data(&read_csv_batch(&path).unwrap()).unwrap_err();
    assert!(matches!(err, IngestError::UnknownCategory { .. }));
    assert_eq!(
        err.to_string(),
        "Unknown category 'Norway' in column 'Country'"
    );
}
