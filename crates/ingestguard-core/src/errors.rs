use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The batch lacks columns the cleaning rules or the partitioner depend on
    #[error("Schema mismatch: missing column(s) {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// A category value has no entry in the fixed lookup table
    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    /// A raw value could not be converted to its canonical type
    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    /// Row partitioning needs per-row keys, only present in complete results
    #[error("Validation result for '{0}' was not produced in complete mode, no row keys available")]
    MissingDiagnostics(String),

    /// An expectation was declared with unusable parameters
    #[error("Invalid expectation: {0}")]
    InvalidExpectation(String),

    /// The CSV file had no header line
    #[error("CSV file is empty: '{0}'")]
    EmptyFile(String),

    /// The Arrow kernel produced an error (e.g., unsupported cast)
    #[error("Arrow computation error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// CSV reading or IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IngestError {
    pub fn missing_column(name: &str) -> Self {
        IngestError::SchemaMismatch {
            missing: vec![name.to_string()],
        }
    }
}
