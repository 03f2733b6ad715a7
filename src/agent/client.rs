use crate::scheduler::protocol::{TaskPayload, TaskResponse, TaskResult, ENDPOINT_TASK};

use anyhow::Result;
use std::time::Duration;

/// HTTP client for the orchestrator's internal worker API.
pub struct OrchestratorClient {
    base_url: String,
    http: reqwest::Client,
}

impl OrchestratorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Asks for the next ready task. 404 means nothing is leasable right
    /// now; the caller idles and polls again.
    pub async fn fetch_task(&self) -> Result<Option<TaskPayload>> {
        let url = format!("{}{}", self.base_url, ENDPOINT_TASK);

        let response = self
            .http
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            anyhow::bail!("unexpected status code: {}", response.status());
        }

        let task_response: TaskResponse = response.json().await?;
        Ok(Some(task_response.task))
    }

    /// Reports a task outcome. Retried so a transient orchestrator hiccup
    /// does not lose a computed result.
    pub async fn submit_result(&self, result: &TaskResult) -> Result<()> {
        let url = format!("{}{}", self.base_url, ENDPOINT_TASK);

        let response = self
            .post_with_retry(url, result, Duration::from_secs(10), 3)
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("result submission failed: {}", response.status());
        }

        Ok(())
    }

    async fn post_with_retry<T: serde::Serialize>(
        &self,
        url: String,
        payload: &T,
        timeout: Duration,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self
                .http
                .post(url.clone())
                .json(payload)
                .timeout(timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}
