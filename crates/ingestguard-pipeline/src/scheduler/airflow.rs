//! Airflow REST API (v1) client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{RunStatus, TriggeredRun, WorkflowScheduler};
use crate::config::SchedulerConfig;
use crate::errors::SchedulerError;

#[derive(Debug, Deserialize)]
struct DagList {
    dags: Vec<Dag>,
}

#[derive(Debug, Deserialize)]
struct Dag {
    dag_id: String,
}

#[derive(Debug, Deserialize)]
struct DagRun {
    #[serde(default)]
    dag_run_id: Option<String>,
    state: String,
    #[serde(default)]
    end_date: Option<DateTime<Utc>>,
}

/// Run ids follow `<dag_id>_<uuid hex>`.
pub(crate) fn new_run_id(dag_id: &str) -> String {
    format!("{}_{}", dag_id, Uuid::new_v4().simple())
}

pub struct AirflowClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl AirflowClient {
    pub fn new(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SchedulerError> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "send: API error");
            return Err(SchedulerError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        serde_json::from_str(&body).map_err(|e| SchedulerError::InvalidResponse(e.to_string()))
    }

    pub async fn list_workflows(&self) -> Result<Vec<String>, SchedulerError> {
        let dags: DagList = self.send(self.http.get(self.url("/dags"))).await?;
        Ok(dags.dags.into_iter().map(|d| d.dag_id).collect())
    }
}

#[async_trait]
impl WorkflowScheduler for AirflowClient {
    async fn workflow_exists(&self, workflow_id: &str) -> Result<bool, SchedulerError> {
        Ok(self.list_workflows().await?.iter().any(|id| id == workflow_id))
    }

    async fn trigger_run(&self, workflow_id: &str) -> Result<TriggeredRun, SchedulerError> {
        let run_id = new_run_id(workflow_id);
        debug!(workflow_id, %run_id, "trigger_run: posting run");
        let run: DagRun = self
            .send(
                self.http
                    .post(self.url(&format!("/dags/{}/dagRuns", workflow_id)))
                    .json(&json!({ "dag_run_id": run_id })),
            )
            .await?;

        Ok(TriggeredRun {
            workflow_id: workflow_id.to_string(),
            run_id: run.dag_run_id.unwrap_or(run_id),
            state: run.state,
        })
    }

    async fn run_status(
        &self,
        workflow_id: &str,
        run_id: &str,
    ) -> Result<RunStatus, SchedulerError> {
        let run: DagRun = self
            .send(
                self.http
                    .get(self.url(&format!("/dags/{}/dagRuns/{}", workflow_id, run_id))),
            )
            .await?;
        Ok(RunStatus {
            state: run.state,
            end_time: run.end_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_format() {
        let run_id = new_run_id("cookbook2_validate_and_handle_invalid_data");
        let suffix = run_id
            .strip_prefix("cookbook2_validate_and_handle_invalid_data_")
            .unwrap();
        assert_eq!(suffix.len(), 32);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_dag_run_decoding() {
        let run: DagRun = serde_json::from_str(
            r#"{"dag_run_id": "x_1", "state": "success", "end_date": "2024-05-01T10:00:00+00:00"}"#,
        )
        .unwrap();
        assert_eq!(run.state, "success");
        assert!(run.end_date.is_some());

        let running: DagRun =
            serde_json::from_str(r#"{"state": "running", "end_date": null}"#).unwrap();
        assert!(running.end_date.is_none());
        assert!(running.dag_run_id.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = SchedulerConfig {
            base_url: "http://airflow:8080/api/v1/".to_string(),
            ..SchedulerConfig::default()
        };
        let client = AirflowClient::new(&config).unwrap();
        assert_eq!(client.url("/dags"), "http://airflow:8080/api/v1/dags");
    }
}
