use super::client::OrchestratorClient;
use crate::ops;
use crate::scheduler::protocol::{TaskPayload, TaskResult};

use std::sync::Arc;
use std::time::Duration;

/// Pool of polling worker loops sharing one orchestrator client.
pub struct AgentPool {
    client: Arc<OrchestratorClient>,
    worker_count: usize,
}

impl AgentPool {
    pub fn new(client: OrchestratorClient, worker_count: usize) -> Self {
        Self {
            client: Arc::new(client),
            worker_count,
        }
    }

    pub fn start(&self) -> Vec<tokio::task::JoinHandle<()>> {
        tracing::info!("Starting {} agent workers", self.worker_count);

        (0..self.worker_count)
            .map(|worker_id| {
                let client = self.client.clone();
                tokio::spawn(async move {
                    worker_loop(client, worker_id).await;
                })
            })
            .collect()
    }
}

async fn worker_loop(client: Arc<OrchestratorClient>, worker_id: usize) {
    tracing::info!("Worker {} started", worker_id);

    loop {
        match client.fetch_task().await {
            Ok(Some(task)) => {
                process_task(&client, worker_id, task).await;
            }
            Ok(None) => {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Err(e) => {
                tracing::warn!("Worker {}: orchestrator unreachable: {}", worker_id, e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn process_task(client: &OrchestratorClient, worker_id: usize, task: TaskPayload) {
    tracing::debug!(
        "Worker {} computing task {} ({} {} {})",
        worker_id,
        task.id,
        task.arg1,
        task.operation,
        task.arg2
    );

    // Simulated cost of the operation.
    tokio::time::sleep(Duration::from_millis(task.operation_time)).await;

    let result = task_outcome(&task);

    match &result.error {
        None => tracing::info!(
            "Worker {} finished task {}: {} {} {} = {}",
            worker_id,
            task.id,
            task.arg1,
            task.operation,
            task.arg2,
            result.result
        ),
        Some(message) => tracing::warn!(
            "Worker {}: task {} failed: {}",
            worker_id,
            task.id,
            message
        ),
    }

    if let Err(e) = client.submit_result(&result).await {
        tracing::error!(
            "Worker {} failed to submit result for task {}: {}",
            worker_id,
            task.id,
            e
        );
    }
}

pub(crate) fn task_outcome(task: &TaskPayload) -> TaskResult {
    match ops::evaluate(&task.operation, &task.arg1, &task.arg2) {
        Ok(value) => TaskResult {
            id: task.id.clone(),
            result: value,
            error: None,
        },
        Err(e) => TaskResult {
            id: task.id.clone(),
            result: 0.0,
            error: Some(e.to_string()),
        },
    }
}
