use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Unknown record type '{0}'. Supported: customers, products, product_category, product_subcategory")]
    UnknownRecordType(String),
    #[error("Workflow '{workflow}' is still running after {checks} check(s)")]
    WorkflowStillRunning { workflow: String, checks: u32 },
}
