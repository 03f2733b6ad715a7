//! In-process worker pool.
//!
//! Drains the manager directly instead of going through the HTTP protocol.
//! Meant for single-machine deployments where no separate agent process is
//! running; behaves like an agent otherwise (simulated latency included).

use super::manager::TaskManager;
use super::protocol::TaskResult;
use crate::ops;

use std::sync::Arc;
use std::time::Duration;

pub fn spawn_local_workers(
    manager: Arc<TaskManager>,
    count: usize,
) -> Vec<tokio::task::JoinHandle<()>> {
    (0..count)
        .map(|worker_id| {
            let manager = manager.clone();
            tokio::spawn(async move {
                worker_loop(manager, worker_id).await;
            })
        })
        .collect()
}

async fn worker_loop(manager: Arc<TaskManager>, worker_id: usize) {
    tracing::info!("Local worker {} started", worker_id);

    loop {
        let Some(task) = manager.next_task() else {
            tokio::time::sleep(Duration::from_millis(100)).await;
            continue;
        };

        tracing::debug!(
            "Local worker {} picked task {} ({} {} {})",
            worker_id,
            task.id,
            task.arg1,
            task.operation,
            task.arg2
        );

        tokio::time::sleep(Duration::from_millis(task.operation_time)).await;

        let result = match ops::evaluate(&task.operation, &task.arg1, &task.arg2) {
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
        };

        if let Err(e) = manager.update_task_result(result) {
            tracing::error!(
                "Local worker {} could not report task {}: {}",
                worker_id,
                task.id,
                e
            );
        }
    }
}
