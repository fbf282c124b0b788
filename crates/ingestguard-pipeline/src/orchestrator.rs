//! Load, clean, validate, partition and persist one input file.
//!
//! A run moves through `Loaded -> Cleaned -> Validated -> [Partitioned] ->
//! Persisted -> Done`. Hard-fail record types abort the run from `Validated`
//! before anything is written; soft-fail record types split off their
//! failing rows and carry on with the rest.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ingestguard_core::{
    Batch, BinPreset, HistogramBin, RecordType, ResultFormat, Severity, ValidationResult,
    clean_customer_data, clean_product_data, partition, read_csv_batch, validate,
    write_invalid_rows,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ExportConfig, PipelineConfig};
use crate::errors::PipelineError;
use crate::retry::RetryPolicy;
use crate::store::RecordStore;

const STORE_SERVICE: &str = "database";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Loaded,
    Cleaned,
    Validated,
    Partitioned,
    Persisted,
    Done,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-table outcome of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableReport {
    pub table: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub inserted: u64,
    pub failed_expectations: Vec<String>,
    pub export_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pipeline: String,
    pub source: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    states: Vec<RunState>,
    tables: Vec<TableReport>,
}

impl RunReport {
    fn new(pipeline: &str, source: &Path) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            source: source.to_path_buf(),
            started_at: Utc::now(),
            finished_at: None,
            states: Vec::new(),
            tables: Vec::new(),
        }
    }

    fn enter(&mut self, state: RunState) {
        info!(pipeline = %self.pipeline, state = %state, "Run state");
        self.states.push(state);
        if matches!(state, RunState::Done | RunState::Aborted) {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn states(&self) -> &[RunState] {
        &self.states
    }

    pub fn final_state(&self) -> Option<RunState> {
        self.states.last().copied()
    }

    pub fn tables(&self) -> &[TableReport] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn inserted_total(&self) -> u64 {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut TableReport> {
        self.tables.iter_mut().find(|t| t.table == name)
    }
}

/// A cleaned table waiting for its validation gate.
struct Staged {
    record_type: RecordType,
    batch: Batch,
    result: ValidationResult,
}

pub struct Orchestrator {
    store: Arc<dyn RecordStore>,
    retry: RetryPolicy,
    export: ExportConfig,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn RecordStore>, config: &PipelineConfig) -> Self {
        Self {
            store,
            retry: config.retry.policy(),
            export: config.export.clone(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_export(mut self, enabled: bool) -> Self {
        self.export.enabled = enabled;
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Ingest a raw customer export into `customers`.
    pub async fn run_customer_ingest(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<RunReport, PipelineError> {
        let path = path.as_ref();
        let mut report = RunReport::new("customer_ingest", path);

        let raw = read_csv_batch(path)?;
        info!(path = %path.display(), rows = raw.num_rows(), "Loaded customer file");
        report.enter(RunState::Loaded);

        let cleaned = clean_customer_data(&raw)?;
        report.enter(RunState::Cleaned);

        let staged = vec![stage(RecordType::Customer, cleaned)?];
        self.finish(report, staged).await
    }

    /// Ingest a raw product export into `product_category`,
    /// `product_subcategory` and `products`, in that order.
    pub async fn run_product_ingest(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<RunReport, PipelineError> {
        let path = path.as_ref();
        let mut report = RunReport::new("product_ingest", path);

        let raw = read_csv_batch(path)?;
        info!(path = %path.display(), rows = raw.num_rows(), "Loaded product file");
        report.enter(RunState::Loaded);

        let tables = clean_product_data(&raw)?;
        report.enter(RunState::Cleaned);

        // every table is validated before any of them is persisted
        let staged = vec![
            stage(RecordType::ProductCategory, tables.categories)?,
            stage(RecordType::ProductSubcategory, tables.subcategories)?,
            stage(RecordType::Product, tables.products)?,
        ];
        self.finish(report, staged).await
    }

    async fn finish(
        &self,
        mut report: RunReport,
        staged: Vec<Staged>,
    ) -> Result<RunReport, PipelineError> {
        for table in &staged {
            report.tables.push(TableReport {
                table: table.record_type.table().to_string(),
                total_rows: table.batch.num_rows(),
                valid_rows: table.batch.num_rows(),
                failed_expectations: table.result.failed_expectations(),
                ..TableReport::default()
            });
        }
        report.enter(RunState::Validated);

        if let Some(failed) = staged
            .iter()
            .find(|t| t.record_type.severity() == Severity::HardFail && !t.result.is_passed())
        {
            report.enter(RunState::Aborted);
            let failed_expectations = failed.result.failed_expectations();
            warn!(
                table = failed.record_type.table(),
                failed = ?failed_expectations,
                trail = ?report.states(),
                "Validation failed, run aborted before persistence"
            );
            return Err(PipelineError::ValidationHardFailure {
                table: failed.record_type.table().to_string(),
                failed_expectations,
            });
        }

        let mut to_persist = Vec::with_capacity(staged.len());
        let mut partitioned = false;
        for table in staged {
            if table.result.is_passed() {
                to_persist.push((table.record_type, table.batch));
                continue;
            }
            let name = table.record_type.table();
            let split = partition(&table.batch, &table.result)?;
            warn!(
                table = name,
                valid = split.valid.num_rows(),
                invalid = split.invalid.num_rows(),
                "Validation failed, invalid rows split off"
            );
            let export_path = if self.export.enabled && split.invalid.num_rows() > 0 {
                Some(write_invalid_rows(&self.export.directory, name, &split.invalid)?)
            } else {
                None
            };
            if let Some(entry) = report.table_mut(name) {
                entry.valid_rows = split.valid.num_rows();
                entry.invalid_rows = split.invalid.num_rows();
                entry.export_path = export_path;
            }
            partitioned = true;
            to_persist.push((table.record_type, split.valid));
        }
        if partitioned {
            report.enter(RunState::Partitioned);
        }

        for (record_type, batch) in &to_persist {
            let inserted = self.persist(*record_type, batch).await?;
            if let Some(entry) = report.table_mut(record_type.table()) {
                entry.inserted = inserted;
            }
        }
        report.enter(RunState::Persisted);
        report.enter(RunState::Done);
        Ok(report)
    }

    async fn persist(&self, record_type: RecordType, batch: &Batch) -> Result<u64, PipelineError> {
        let table = record_type.table();
        let key_column = record_type.key_column();
        if batch.num_rows() == 0 {
            info!(table, "No rows to insert");
            return Ok(0);
        }
        let store = self.store.as_ref();
        let inserted = self
            .retry
            .run(STORE_SERVICE, || store.insert_ignore(table, key_column, batch))
            .await?;
        info!(
            table,
            rows = batch.num_rows(),
            inserted,
            "{} new row(s) inserted into {}",
            inserted,
            table
        );
        Ok(inserted)
    }

    /// Read `column` of `table` from the store and count it into `preset` bins.
    pub async fn profile_column(
        &self,
        table: &str,
        column: &str,
        preset: BinPreset,
    ) -> Result<Vec<HistogramBin>, PipelineError> {
        let store = self.store.as_ref();
        let values = self
            .retry
            .run(STORE_SERVICE, || store.fetch_numeric_column(table, column))
            .await?;
        info!(table, column, values = values.len(), "Profiling column");
        Ok(preset.histogram(&values))
    }
}

fn stage(record_type: RecordType, batch: Batch) -> Result<Staged, PipelineError> {
    let suite = record_type.suite()?;
    let result = validate(&batch, &suite, ResultFormat::Complete)?;
    info!(
        table = record_type.table(),
        rows = batch.num_rows(),
        passed = result.is_passed(),
        "Validated"
    );
    Ok(Staged {
        record_type,
        batch,
        result,
    })
}

/// Clean and validate a file without persisting anything. Product record
/// types share one raw file, so any of them validates all three tables.
pub fn validate_file(
    record_type: RecordType,
    path: impl AsRef<Path>,
) -> Result<Vec<(RecordType, ValidationResult)>, PipelineError> {
    let raw = read_csv_batch(path)?;
    let staged = match record_type {
        RecordType::Customer => vec![stage(RecordType::Customer, clean_customer_data(&raw)?)?],
        RecordType::Product | RecordType::ProductCategory | RecordType::ProductSubcategory => {
            let tables = clean_product_data(&raw)?;
            vec![
                stage(RecordType::ProductCategory, tables.categories)?,
                stage(RecordType::ProductSubcategory, tables.subcategories)?,
                stage(RecordType::Product, tables.products)?,
            ]
        }
    };
    Ok(staged
        .into_iter()
        .map(|s| (s.record_type, s.result))
        .collect())
}
