//! HTTP Request Handlers
//!
//! Axum route handlers over the [`TaskManager`]. The public routes accept
//! expression submissions and serve status snapshots; the internal routes
//! implement the worker lease/report protocol.

use super::manager::TaskManager;
use super::protocol::*;

use axum::{extract::Path, http::StatusCode, Extension, Json};
use std::sync::Arc;

/// Public API: submits an expression for evaluation.
///
/// Parse failures return 422 and create no expression record.
pub async fn handle_calculate(
    Extension(manager): Extension<Arc<TaskManager>>,
    Json(req): Json<CalculateRequest>,
) -> Result<(StatusCode, Json<CalculateResponse>), (StatusCode, Json<ErrorResponse>)> {
    match manager.create_expression(&req.expression) {
        Ok(id) => Ok((StatusCode::CREATED, Json(CalculateResponse { id }))),
        Err(e) => {
            tracing::warn!("Rejected expression {:?}: {}", req.expression, e);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Public API: lists every expression known to this process.
pub async fn handle_list_expressions(
    Extension(manager): Extension<Arc<TaskManager>>,
) -> Json<ExpressionsResponse> {
    Json(ExpressionsResponse {
        expressions: manager.list_expressions(),
    })
}

/// Public API: snapshot of a single expression.
pub async fn handle_get_expression(
    Extension(manager): Extension<Arc<TaskManager>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Option<ExpressionResponse>>) {
    match manager.get_expression(&id) {
        Some(expression) => (StatusCode::OK, Json(Some(ExpressionResponse { expression }))),
        None => (StatusCode::NOT_FOUND, Json(None)),
    }
}

/// Internal API: leases the next ready task to a worker.
///
/// 404 means nothing is currently leasable; workers poll.
pub async fn handle_next_task(
    Extension(manager): Extension<Arc<TaskManager>>,
) -> (StatusCode, Json<Option<TaskResponse>>) {
    match manager.next_task() {
        Some(task) => (StatusCode::OK, Json(Some(TaskResponse { task }))),
        None => (StatusCode::NOT_FOUND, Json(None)),
    }
}

/// Internal API: ingests a worker's result or compute error.
pub async fn handle_task_result(
    Extension(manager): Extension<Arc<TaskManager>>,
    Json(result): Json<TaskResult>,
) -> Result<Json<AckResponse>, (StatusCode, Json<ErrorResponse>)> {
    match manager.update_task_result(result) {
        Ok(()) => Ok(Json(AckResponse {
            status: "success".to_string(),
        })),
        Err(e) => {
            tracing::warn!("Rejected task report: {}", e);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
