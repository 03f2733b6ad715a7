use super::types::{Expression, TaskId};
use serde::{Deserialize, Serialize};

// Endpoints
pub const ENDPOINT_CALCULATE: &str = "/api/v1/calculate";
pub const ENDPOINT_EXPRESSIONS: &str = "/api/v1/expressions";
pub const ENDPOINT_TASK: &str = "/internal/task";

// Expression submission (public API)
#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub id: String,
}

// Expression status (public API)
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpressionsResponse {
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpressionResponse {
    pub expression: Expression,
}

/// Task as handed to a worker. Both operands are always literal decimal
/// numbers by the time a task leaves the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPayload {
    pub id: TaskId,
    pub arg1: String,
    pub arg2: String,
    pub operation: String,
    pub operation_time: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: TaskPayload,
}

// Worker report (internal API): result xor error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: TaskId,
    #[serde(default)]
    pub result: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
