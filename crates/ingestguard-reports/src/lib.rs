pub mod formatters;
pub mod utils;

use ingestguard_core::{HistogramBin, RecordType, ValidationResult};
use ingestguard_pipeline::{ColumnSchema, RunReport, TriggeredRun, WaitOutcome};

pub use formatters::{json::JsonFormatter, stdout::StdOutFormatter};

/// Receives the events of one CLI command. Formatters either print as events
/// arrive or collect them for a final dump.
pub trait Reporter {
    fn on_start(&self, command: &str);
    fn on_validation_result(&mut self, record_type: RecordType, result: &ValidationResult);
    fn on_run_complete(&mut self, report: &RunReport);
    fn on_schema(&mut self, table: &str, columns: &[ColumnSchema]);
    fn on_histogram(&mut self, table: &str, column: &str, bins: &[HistogramBin]);
    fn on_workflow(&mut self, run: &TriggeredRun, outcome: Option<&WaitOutcome>);
    fn on_message(&mut self, message: &str);
    fn on_summary(&self, passed: usize, failed: usize);
}
