use ingestguard_core::{HistogramBin, RecordType, ValidationResult};
use ingestguard_pipeline::{ColumnSchema, RunReport, TriggeredRun, WaitOutcome};
use prettytable::{Cell, Row, Table};

use crate::{
    Reporter,
    utils::numbers::{format_numbers, format_percent},
};

pub struct StdOutFormatter {
    intro: String,
}

impl StdOutFormatter {
    pub fn new(version: String) -> Self {
        Self {
            intro: format!("IngestGuard v{}", version),
        }
    }

    pub fn outcome_table(result: &ValidationResult) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Expectation"),
            Cell::new("Status"),
            Cell::new("Unexpected"),
            Cell::new("% Unexpected"),
        ]));
        for outcome in result.outcomes() {
            let status = match (&outcome.exception, outcome.success) {
                (Some(_), _) => "ERROR",
                (None, true) => "ok",
                (None, false) => "FAILED",
            };
            table.add_row(Row::new(vec![
                Cell::new(&outcome.expectation.to_string()),
                Cell::new(status),
                Cell::new(&format_numbers(outcome.unexpected_count)),
                Cell::new(&format_percent(outcome.unexpected_percent)),
            ]));
        }
        table
    }

    pub fn schema_table(columns: &[ColumnSchema]) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Column"),
            Cell::new("Type"),
            Cell::new("Nullable"),
            Cell::new("Primary key"),
        ]));
        for column in columns {
            table.add_row(Row::new(vec![
                Cell::new(&column.column),
                Cell::new(&column.data_type),
                Cell::new(&column.nullable.to_string()),
                Cell::new(if column.primary_key { "yes" } else { "" }),
            ]));
        }
        table
    }

    pub fn histogram_table(bins: &[HistogramBin]) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Bin"),
            Cell::new("Mid"),
            Cell::new("Count"),
        ]));
        for bin in bins {
            table.add_row(Row::new(vec![
                Cell::new(&bin.label),
                Cell::new(&bin.mid().to_string()),
                Cell::new(&format_numbers(bin.count)),
            ]));
        }
        table
    }

    pub fn run_table(report: &RunReport) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Table"),
            Cell::new("Rows"),
            Cell::new("Valid"),
            Cell::new("Invalid"),
            Cell::new("Inserted"),
        ]));
        for entry in report.tables() {
            table.add_row(Row::new(vec![
                Cell::new(&entry.table),
                Cell::new(&format_numbers(entry.total_rows)),
                Cell::new(&format_numbers(entry.valid_rows)),
                Cell::new(&format_numbers(entry.invalid_rows)),
                Cell::new(&entry.inserted.to_string()),
            ]));
        }
        table
    }
}

impl Reporter for StdOutFormatter {
    fn on_start(&self, command: &str) {
        let title = format!("{} - {}", self.intro, command);
        println!("{}", title);
        println!("{}", "=".repeat(title.len()));
    }

    fn on_validation_result(&mut self, record_type: RecordType, result: &ValidationResult) {
        let status = if result.is_passed() {
            "PASSED"
        } else {
            "FAILED"
        };
        println!(
            "\n{} ({} rows) - {}",
            record_type,
            format_numbers(result.total_rows),
            status
        );
        print!("{}", Self::outcome_table(result));
        for outcome in result.outcomes() {
            if let Some(message) = &outcome.exception {
                println!("  Error: {}: {}", outcome.expectation, message);
            }
        }
    }

    fn on_run_complete(&mut self, report: &RunReport) {
        println!("\n{} from {}", report.pipeline, report.source.display());
        print!("{}", Self::run_table(report));
        for entry in report.tables() {
            if let Some(path) = &entry.export_path {
                println!(
                    "  {} invalid {} row(s) written to {}",
                    entry.invalid_rows,
                    entry.table,
                    path.display()
                );
            }
        }
        let trail: Vec<String> = report.states().iter().map(|s| s.to_string()).collect();
        println!("  States: {}", trail.join(" -> "));
    }

    fn on_schema(&mut self, table: &str, columns: &[ColumnSchema]) {
        println!("\n{}", table);
        print!("{}", Self::schema_table(columns));
    }

    fn on_histogram(&mut self, table: &str, column: &str, bins: &[HistogramBin]) {
        println!("\n{}.{}", table, column);
        print!("{}", Self::histogram_table(bins));
    }

    fn on_workflow(&mut self, run: &TriggeredRun, outcome: Option<&WaitOutcome>) {
        println!("\nTriggered {} ({})", run.run_id, run.state);
        match outcome {
            Some(WaitOutcome::Finished(status)) => println!("  Finished: {}", status.state),
            Some(WaitOutcome::StillRunning { checks }) => {
                println!("  Still running after {} check(s)", checks)
            }
            None => {}
        }
    }

    fn on_message(&mut self, message: &str) {
        println!("{}", message);
    }

    fn on_summary(&self, passed: usize, failed: usize) {
        println!("\n===================================");
        println!("Result: {} failed, {} passed", failed, passed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestguard_core::BinPreset;

    #[test]
    fn test_schema_table_rows() {
        let columns = vec![
            ColumnSchema {
                column: "customer_id".to_string(),
                data_type: "integer".to_string(),
                nullable: false,
                primary_key: true,
            },
            ColumnSchema {
                column: "name".to_string(),
                data_type: "varchar(100)".to_string(),
                nullable: true,
                primary_key: false,
            },
        ];
        let table = StdOutFormatter::schema_table(&columns);
        assert_eq!(table.len(), 3);
        let rendered = table.to_string();
        assert!(rendered.contains("varchar(100)"));
        assert!(rendered.contains("customer_id"));
    }

    #[test]
    fn test_histogram_table_labels() {
        let bins = BinPreset::Income.histogram(&[5_000.0, 95_000.0]);
        let rendered = StdOutFormatter::histogram_table(&bins).to_string();
        assert!(rendered.contains("Less than $10k"));
        assert!(rendered.contains("$90k+"));
    }
}
