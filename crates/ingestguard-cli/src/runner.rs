use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use ingestguard_core::{BinPreset, RecordType};
use ingestguard_pipeline::{
    AirflowClient, CloudCredentials, MemoryStore, Orchestrator, PgStore, PipelineConfig,
    RecordStore, WaitOutcome, trigger_workflow, validate_file, wait_for_run,
};
use ingestguard_reports::{JsonFormatter, Reporter, StdOutFormatter};
use tracing::info;

use crate::{
    Args, Command, OutputFormat, PresetArg, errors::CliError, parser::parse_config,
    writer::write_report,
};

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::IngestCustomers { .. } => "ingest-customers",
            Command::IngestProducts { .. } => "ingest-products",
            Command::Validate { .. } => "validate",
            Command::Trigger { .. } => "trigger",
            Command::Schema { .. } => "schema",
            Command::Profile { .. } => "profile",
            Command::CheckCloud => "check-cloud",
        }
    }
}

impl From<PresetArg> for BinPreset {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Age => BinPreset::Age,
            PresetArg::Income => BinPreset::Income,
        }
    }
}

/// Run the parsed command. `Ok(false)` means the command completed but
/// reported a failed validation.
pub async fn run(args: Args) -> Result<bool> {
    let config = parse_config(args.config.as_deref())?;
    let version = env!("CARGO_PKG_VERSION").to_string();

    match args.output {
        OutputFormat::Stdout => {
            let mut formatter = StdOutFormatter::new(version);
            execute(&args.command, &config, &mut formatter).await
        }
        OutputFormat::Json => {
            let mut formatter = JsonFormatter::new(version);
            let passed = execute(&args.command, &config, &mut formatter).await?;
            let json = formatter
                .to_json()
                .context("Failed to serialize JSON report")?;
            match args.output_path.as_deref() {
                Some(path) => {
                    let written = write_report(Some(path), args.command.name(), &json)?;
                    info!(path = %written.display(), "JSON report written");
                }
                None => println!("{}", json),
            }
            Ok(passed)
        }
    }
}

async fn connect_store(config: &PipelineConfig, dry_run: bool) -> Result<Arc<dyn RecordStore>> {
    if dry_run {
        info!("Dry run: rows are kept in memory");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = config
        .retry
        .policy()
        .run("database", || PgStore::connect(&config.database))
        .await
        .context("Failed to connect to the database")?;
    Ok(Arc::new(store))
}

pub async fn execute(
    command: &Command,
    config: &PipelineConfig,
    reporter: &mut dyn Reporter,
) -> Result<bool> {
    reporter.on_start(command.name());

    match command {
        Command::IngestCustomers { input, dry_run } => {
            let store = connect_store(config, *dry_run).await?;
            let report = Orchestrator::new(store, config)
                .run_customer_ingest(input)
                .await
                .with_context(|| format!("Customer ingest failed for '{}'", input))?;
            reporter.on_run_complete(&report);
            Ok(true)
        }
        Command::IngestProducts {
            input,
            no_export,
            dry_run,
        } => {
            let store = connect_store(config, *dry_run).await?;
            let report = Orchestrator::new(store, config)
                .with_export(config.export.enabled && !*no_export)
                .run_product_ingest(input)
                .await
                .with_context(|| format!("Product ingest failed for '{}'", input))?;
            reporter.on_run_complete(&report);
            Ok(true)
        }
        Command::Validate { record_type, input } => {
            let record_type = RecordType::from_str(record_type)
                .map_err(|_| CliError::UnknownRecordType(record_type.clone()))?;
            let results = validate_file(record_type, input)
                .with_context(|| format!("Failed to validate '{}'", input))?;
            for (record_type, result) in &results {
                reporter.on_validation_result(*record_type, result);
            }
            let passed = results.iter().filter(|(_, r)| r.is_passed()).count();
            let failed = results.len() - passed;
            reporter.on_summary(passed, failed);
            Ok(failed == 0)
        }
        Command::Trigger { workflow, wait } => {
            let client = AirflowClient::new(&config.scheduler)?;
            let retry = config.retry.policy();
            let run = trigger_workflow(&client, workflow, retry)
                .await
                .with_context(|| format!("Failed to trigger workflow '{}'", workflow))?;
            if !*wait {
                reporter.on_workflow(&run, None);
                return Ok(true);
            }
            let outcome = wait_for_run(
                &client,
                workflow,
                &run.run_id,
                config.scheduler.poll_policy(),
                retry,
            )
            .await
            .with_context(|| format!("Failed to poll workflow run '{}'", run.run_id))?;
            reporter.on_workflow(&run, Some(&outcome));
            if let WaitOutcome::StillRunning { checks } = outcome {
                return Err(CliError::WorkflowStillRunning {
                    workflow: workflow.clone(),
                    checks,
                }
                .into());
            }
            Ok(true)
        }
        Command::Schema { table } => {
            let store = connect_store(config, false).await?;
            let columns = config
                .retry
                .policy()
                .run("database", || store.table_schema(table))
                .await
                .with_context(|| format!("Failed to read schema of '{}'", table))?;
            reporter.on_schema(table, &columns);
            Ok(true)
        }
        Command::Profile {
            table,
            column,
            preset,
        } => {
            let store = connect_store(config, false).await?;
            let bins = Orchestrator::new(store, config)
                .profile_column(table, column, (*preset).into())
                .await
                .with_context(|| format!("Failed to profile '{}.{}'", table, column))?;
            reporter.on_histogram(table, column, &bins);
            Ok(true)
        }
        Command::CheckCloud => {
            let credentials = CloudCredentials::from_env()?;
            reporter.on_message(&format!(
                "GX Cloud credentials found for organization {}",
                credentials.organization_id()
            ));
            Ok(true)
        }
    }
}
