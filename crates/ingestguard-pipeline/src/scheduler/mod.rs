//! Triggering workflow runs on an external scheduler and waiting for them.

mod airflow;

pub use airflow::AirflowClient;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{PipelineError, SchedulerError};
use crate::retry::RetryPolicy;

/// Run states that mean the run has not finished yet.
const ACTIVE_STATES: [&str; 2] = ["queued", "running"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggeredRun {
    pub workflow_id: String,
    pub run_id: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatus {
    pub state: String,
    pub end_time: Option<DateTime<Utc>>,
}

impl RunStatus {
    /// A run is finished once it has an end time and left the active states.
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some() && !ACTIVE_STATES.contains(&self.state.as_str())
    }
}

#[async_trait]
pub trait WorkflowScheduler: Send + Sync {
    async fn workflow_exists(&self, workflow_id: &str) -> Result<bool, SchedulerError>;

    /// Start one run. Not idempotent: every successful call starts a new run.
    async fn trigger_run(&self, workflow_id: &str) -> Result<TriggeredRun, SchedulerError>;

    async fn run_status(&self, workflow_id: &str, run_id: &str)
    -> Result<RunStatus, SchedulerError>;
}

/// Bounded polling: the `n`-th wait lasts `n * interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_checks: u32,
}

impl PollPolicy {
    pub fn delay_before(&self, check: u32) -> Duration {
        self.interval.saturating_mul(check)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_checks: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WaitOutcome {
    Finished(RunStatus),
    StillRunning { checks: u32 },
}

impl WaitOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, WaitOutcome::Finished(_))
    }
}

/// Check that the workflow exists, then start a run. Only the lookup is
/// retried, the run itself is posted once.
pub async fn trigger_workflow<S>(
    scheduler: &S,
    workflow_id: &str,
    retry: RetryPolicy,
) -> Result<TriggeredRun, PipelineError>
where
    S: WorkflowScheduler + ?Sized,
{
    let exists = retry
        .run("scheduler", || scheduler.workflow_exists(workflow_id))
        .await?;
    if !exists {
        return Err(SchedulerError::UnknownWorkflow(workflow_id.to_string()).into());
    }
    let run = scheduler.trigger_run(workflow_id).await?;
    info!(workflow_id, run_id = %run.run_id, state = %run.state, "Triggered workflow run");
    Ok(run)
}

/// Poll `run_id` until it finishes or `policy.max_checks` checks were made.
/// The first check happens immediately. Each status request goes through
/// `retry`, so a transient scheduler error does not end the wait.
pub async fn wait_for_run<S>(
    scheduler: &S,
    workflow_id: &str,
    run_id: &str,
    policy: PollPolicy,
    retry: RetryPolicy,
) -> Result<WaitOutcome, PipelineError>
where
    S: WorkflowScheduler + ?Sized,
{
    let max_checks = policy.max_checks.max(1);
    let mut checks = 0;
    while checks < max_checks {
        if checks > 0 {
            tokio::time::sleep(policy.delay_before(checks)).await;
        }
        let status = retry
            .run("scheduler", || scheduler.run_status(workflow_id, run_id))
            .await?;
        checks += 1;
        debug!(workflow_id, run_id, state = %status.state, checks, "wait_for_run: status");
        if status.is_finished() {
            info!(workflow_id, run_id, state = %status.state, "Workflow run finished");
            return Ok(WaitOutcome::Finished(status));
        }
    }
    warn!(workflow_id, run_id, checks, "Workflow run is still running");
    Ok(WaitOutcome::StillRunning { checks })
}

pub async fn trigger_and_wait<S>(
    scheduler: &S,
    workflow_id: &str,
    policy: PollPolicy,
    retry: RetryPolicy,
) -> Result<(TriggeredRun, WaitOutcome), PipelineError>
where
    S: WorkflowScheduler + ?Sized,
{
    let run = trigger_workflow(scheduler, workflow_id, retry).await?;
    let outcome = wait_for_run(scheduler, workflow_id, &run.run_id, policy, retry).await?;
    Ok((run, outcome))
}
