use chrono::Local;
use ingestguard_core::{HistogramBin, RecordType, ValidationResult};
use ingestguard_pipeline::{ColumnSchema, RunReport, TriggeredRun, WaitOutcome};
use serde::Serialize;
use serde_json::Error;

use crate::Reporter;

#[derive(Serialize)]
pub struct JsonFormatter {
    version: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    validations: Vec<SuiteFormatter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    runs: Vec<RunReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    schemas: Vec<SchemaFormatter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    histograms: Vec<HistogramFormatter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    workflows: Vec<WorkflowFormatter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<String>,
}

#[derive(Serialize)]
struct SuiteFormatter {
    table: String,
    suite: String,
    n_rows: usize,
    pass: bool,
    expectations: Vec<ExpectationFormatter>,
}

#[derive(Serialize)]
struct ExpectationFormatter {
    name: String,
    description: String,
    success: bool,
    unexpected: usize,
    unexpected_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unexpected_keys: Option<Vec<i64>>,
}

#[derive(Serialize)]
struct SchemaFormatter {
    table: String,
    columns: Vec<ColumnSchema>,
}

#[derive(Serialize)]
struct HistogramFormatter {
    table: String,
    column: String,
    bins: Vec<BinFormatter>,
}

#[derive(Serialize)]
struct BinFormatter {
    label: String,
    lower: f64,
    mid: f64,
    upper: f64,
    count: usize,
}

#[derive(Serialize)]
struct WorkflowFormatter {
    run: TriggeredRun,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<WaitOutcome>,
}

impl JsonFormatter {
    pub fn new(version: String) -> Self {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            version,
            timestamp,
            validations: Vec::new(),
            runs: Vec::new(),
            schemas: Vec::new(),
            histograms: Vec::new(),
            workflows: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Reporter for JsonFormatter {
    fn on_start(&self, _command: &str) {}

    fn on_validation_result(&mut self, record_type: RecordType, result: &ValidationResult) {
        let expectations = result
            .outcomes()
            .iter()
            .map(|o| ExpectationFormatter {
                name: o.expectation.name().to_string(),
                description: o.expectation.to_string(),
                success: o.success,
                unexpected: o.unexpected_count,
                unexpected_percent: o.unexpected_percent,
                exception: o.exception.clone(),
                unexpected_keys: o.unexpected_keys.clone(),
            })
            .collect();
        self.validations.push(SuiteFormatter {
            table: record_type.table().to_string(),
            suite: result.suite_name.clone(),
            n_rows: result.total_rows,
            pass: result.is_passed(),
            expectations,
        });
    }

    fn on_run_complete(&mut self, report: &RunReport) {
        self.runs.push(report.clone());
    }

    fn on_schema(&mut self, table: &str, columns: &[ColumnSchema]) {
        self.schemas.push(SchemaFormatter {
            table: table.to_string(),
            columns: columns.to_vec(),
        });
    }

    fn on_histogram(&mut self, table: &str, column: &str, bins: &[HistogramBin]) {
        self.histograms.push(HistogramFormatter {
            table: table.to_string(),
            column: column.to_string(),
            bins: bins
                .iter()
                .map(|b| BinFormatter {
                    label: b.label.clone(),
                    lower: b.lower,
                    mid: b.mid(),
                    upper: b.upper,
                    count: b.count,
                })
                .collect(),
        });
    }

    fn on_workflow(&mut self, run: &TriggeredRun, outcome: Option<&WaitOutcome>) {
        self.workflows.push(WorkflowFormatter {
            run: run.clone(),
            outcome: outcome.cloned(),
        });
    }

    fn on_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn on_summary(&self, _passed: usize, _failed: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestguard_core::{ResultFormat, read_csv_str, validate};

    #[test]
    fn test_validation_json() {
        let batch = read_csv_str("product_category_id,name\n1,Audio\n").unwrap();
        let suite = RecordType::ProductCategory.suite().unwrap();
        let result = validate(&batch, &suite, ResultFormat::Complete).unwrap();

        let mut formatter = JsonFormatter::new("0.1.0".to_string());
        formatter.on_validation_result(RecordType::ProductCategory, &result);
        let value: serde_json::Value = serde_json::from_str(&formatter.to_json().unwrap()).unwrap();

        assert_eq!(value["version"], "0.1.0");
        let suite = &value["validations"][0];
        assert_eq!(suite["table"], "product_category");
        assert_eq!(suite["n_rows"], 1);
        assert!(!suite["expectations"].as_array().unwrap().is_empty());
        assert!(value.get("runs").is_none());
    }

    #[test]
    fn test_schema_json() {
        let mut formatter = JsonFormatter::new("0.1.0".to_string());
        formatter.on_schema(
            "customers",
            &[ColumnSchema {
                column: "customer_id".to_string(),
                data_type: "integer".to_string(),
                nullable: false,
                primary_key: true,
            }],
        );
        let value: serde_json::Value = serde_json::from_str(&formatter.to_json().unwrap()).unwrap();
        assert_eq!(value["schemas"][0]["columns"][0]["primary_key"], true);
    }
}
