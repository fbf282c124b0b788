pub mod cloud;
pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod retry;
pub mod scheduler;
pub mod store;

pub use cloud::CloudCredentials;
pub use config::{DatabaseConfig, ExportConfig, PipelineConfig, RetryConfig, SchedulerConfig};
pub use errors::{CredentialsError, PipelineError, Retryable, SchedulerError, StoreError};
pub use orchestrator::{Orchestrator, RunReport, RunState, TableReport, validate_file};
pub use retry::RetryPolicy;
pub use scheduler::{
    AirflowClient, PollPolicy, RunStatus, TriggeredRun, WaitOutcome, WorkflowScheduler,
    trigger_and_wait, trigger_workflow, wait_for_run,
};
pub use store::{ColumnSchema, MemoryStore, PgStore, RecordStore};
