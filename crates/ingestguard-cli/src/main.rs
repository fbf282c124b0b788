mod errors;
mod parser;
mod runner;
mod writer;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for command results
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Print results to standard output (human-readable)
    Stdout,
    /// Output results in JSON format
    Json,
}

/// Bin layout for the `profile` command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetArg {
    /// 10-year age bins from 0 to 100
    Age,
    /// $10k income bins from 0 to $100k
    Income,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Clean, validate and persist a raw customer export
    IngestCustomers {
        #[arg(short, long, value_name = "PATH")]
        input: String,
        /// Keep everything in memory instead of writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Clean, validate and persist a raw product export, splitting off invalid rows
    IngestProducts {
        #[arg(short, long, value_name = "PATH")]
        input: String,
        /// Do not write invalid rows to the export directory
        #[arg(long)]
        no_export: bool,
        /// Keep everything in memory instead of writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Clean and validate a file without persisting it
    Validate {
        /// customers, products, product_category or product_subcategory
        #[arg(short, long)]
        record_type: String,
        #[arg(short, long, value_name = "PATH")]
        input: String,
    },
    /// Trigger a scheduler workflow run
    Trigger {
        #[arg(short, long)]
        workflow: String,
        /// Poll the run until it finishes or the check budget is spent
        #[arg(long)]
        wait: bool,
    },
    /// Show the schema of a database table
    Schema {
        #[arg(short, long)]
        table: String,
    },
    /// Bin a numeric column of a database table
    Profile {
        #[arg(short, long)]
        table: String,
        #[arg(short, long)]
        column: String,
        #[arg(short, long, value_enum)]
        preset: PresetArg,
    },
    /// Check that GX Cloud credentials are set in the environment
    CheckCloud,
}

#[derive(Parser, Debug)]
#[command(
    name = "ingestguard",
    version,
    author = "IngestGuard Contributors",
    about = "IngestGuard CLI - Validate and load customer and product exports",
    long_about = "IngestGuard cleans raw CSV exports, validates them against expectation \
                  suites and loads the valid rows into Postgres.\n\n\
                  Example usage:\n  \
                  ingestguard --config pipeline.toml ingest-customers --input customers.csv"
)]
pub struct Args {
    /// Path to the TOML pipeline configuration; defaults apply when omitted
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Output format for command results
    #[arg(short, long, value_enum, default_value = "stdout", global = true)]
    output: OutputFormat,

    /// Write JSON output to this file or directory instead of stdout
    #[arg(long, value_name = "PATH", global = true)]
    output_path: Option<String>,

    /// Enable debug logging and detailed error chains
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() {
    let args = Args::parse();
    let debug = args.debug;
    init_logging(debug);

    let result: Result<bool> = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
        .and_then(|runtime| runtime.block_on(runner::run(args)));

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            if debug {
                eprintln!("Error: {:?}", err);
            } else {
                eprintln!("Error: {:#}", err);
                eprintln!("\nHint: Run with --debug flag for detailed error chains");
            }
            std::process::exit(1);
        }
    }
}
