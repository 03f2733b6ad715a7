use axum::http::StatusCode;
use axum::{
    extract::Extension,
    routing::{get, post},
    Json, Router,
};
use distributed_calc::config::OrchestratorConfig;
use distributed_calc::scheduler::handlers::{
    handle_calculate, handle_get_expression, handle_list_expressions, handle_next_task,
    handle_task_result,
};
use distributed_calc::scheduler::manager::TaskManager;
use distributed_calc::scheduler::protocol::{
    ENDPOINT_CALCULATE, ENDPOINT_EXPRESSIONS, ENDPOINT_TASK,
};
use distributed_calc::scheduler::worker::spawn_local_workers;
use serde::Serialize;
use std::sync::Arc;
use sysinfo::System;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = OrchestratorConfig::from_env();

    tracing::info!("Starting orchestrator on {}", config.bind_addr);
    tracing::info!(
        "Queue capacity {}, operation times {:?}",
        config.queue_capacity,
        config.operation_times
    );

    let manager = TaskManager::new(config.queue_capacity, config.operation_times.clone());

    if config.local_workers > 0 {
        tracing::info!("Spawning {} local workers", config.local_workers);
        spawn_local_workers(manager.clone(), config.local_workers);
    }

    let app = Router::new()
        .route("/health/routes", get(handle_routes))
        .route("/health/stats", get(handle_stats))
        // Public API
        .route(ENDPOINT_CALCULATE, post(handle_calculate))
        .route(ENDPOINT_EXPRESSIONS, get(handle_list_expressions))
        .route(
            &format!("{}/:id", ENDPOINT_EXPRESSIONS),
            get(handle_get_expression),
        )
        // Internal worker API
        .route(ENDPOINT_TASK, get(handle_next_task).post(handle_task_result))
        .layer(Extension(manager.clone()));

    tracing::info!("HTTP server listening on {}", config.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct RoutesResponse {
    routes: Vec<&'static str>,
}

#[derive(Serialize)]
struct StatsResponse {
    expressions: usize,
    expressions_processing: usize,
    expressions_completed: usize,
    expressions_error: usize,
    tasks: usize,
    tasks_pending: usize,
    tasks_leased: usize,
    tasks_completed: usize,
    tasks_failed: usize,
    queue_depth: usize,
    cpu_usage: f32,
    mem_used_mb: u64,
    mem_total_mb: u64,
}

async fn handle_routes() -> Json<RoutesResponse> {
    Json(RoutesResponse {
        routes: vec![
            "/health/routes",
            "/health/stats",
            "/api/v1/calculate",
            "/api/v1/expressions",
            "/api/v1/expressions/:id",
            "/internal/task",
        ],
    })
}

async fn handle_stats(
    Extension(manager): Extension<Arc<TaskManager>>,
) -> (StatusCode, Json<StatsResponse>) {
    let (processing, completed, error) = manager.expression_status_counts();
    let (pending, leased, done, failed) = manager.task_status_counts();

    let mut sys = System::new_all();
    sys.refresh_cpu();
    sys.refresh_memory();
    let cpu_usage = sys.global_cpu_info().cpu_usage();
    // sysinfo returns bytes for memory values.
    let mem_total_mb = sys.total_memory() / (1024 * 1024);
    let mem_used_mb = sys.used_memory() / (1024 * 1024);

    (
        StatusCode::OK,
        Json(StatsResponse {
            expressions: manager.expression_count(),
            expressions_processing: processing,
            expressions_completed: completed,
            expressions_error: error,
            tasks: manager.task_count(),
            tasks_pending: pending,
            tasks_leased: leased,
            tasks_completed: done,
            tasks_failed: failed,
            queue_depth: manager.queue_depth(),
            cpu_usage,
            mem_used_mb,
            mem_total_mb,
        }),
    )
}
