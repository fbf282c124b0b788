pub mod cleaner;
pub mod errors;
pub mod expectations;
pub mod export;
pub mod partition;
pub mod profile;
pub mod reader;
pub mod record_type;
pub mod results;
pub mod rules;
pub mod types;
pub mod utils;
pub mod validator;

pub use cleaner::{ProductTables, clean, clean_customer_data, clean_product_data};
pub use errors::IngestError;
pub use expectations::{Expectation, ExpectationSuite, ValueType};
pub use export::write_invalid_rows;
pub use partition::{Partition, partition};
pub use profile::{BinPreset, HistogramBin, histogram};
pub use reader::{read_csv_batch, read_csv_str};
pub use record_type::{RecordType, Severity};
pub use results::{ExpectationOutcome, ResultFormat, ValidationResult};
pub use types::Batch;
pub use validator::validate;
