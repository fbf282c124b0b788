use ingestguard_core::IngestError;
use thiserror::Error;

/// Errors that may succeed when the same call is made again later.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Table '{0}' not found")]
    UnknownTable(String),

    #[error("Column '{column}' of type {data_type} cannot be stored")]
    UnsupportedColumn { column: String, data_type: String },

    #[error("Key column '{0}' missing or not an integer column")]
    InvalidKey(String),

    #[error("Arrow computation error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        match self {
            StoreError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Tls(_)
            ),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Scheduler API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Workflow {0} not found.")]
    UnknownWorkflow(String),

    #[error("Invalid scheduler response: {0}")]
    InvalidResponse(String),
}

impl Retryable for SchedulerError {
    fn is_retryable(&self) -> bool {
        match self {
            SchedulerError::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            SchedulerError::Api { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            SchedulerError::UnknownWorkflow(_) | SchedulerError::InvalidResponse(_) => false,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialsError {
    #[error(
        "{var} environment variable is undefined. Use this environment variable to provide your GX Cloud {what}."
    )]
    MissingCredentials { var: String, what: String },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Validation failed for '{table}': {}", .failed_expectations.join("; "))]
    ValidationHardFailure {
        table: String,
        failed_expectations: Vec<String>,
    },

    #[error("{service} unavailable after {attempts} attempt(s): {message}")]
    ExternalServiceError {
        service: String,
        attempts: u32,
        message: String,
    },
}
