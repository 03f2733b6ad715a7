use crate::ops::Op;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionStatus {
    Processing,
    Completed,
    Error,
}

impl ExpressionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExpressionStatus::Completed | ExpressionStatus::Error)
    }
}

/// Wire-visible snapshot of a submitted expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expression {
    pub id: String,
    #[serde(rename = "expression")]
    pub input: String,
    pub status: ExpressionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Leased,
    Completed,
    Failed,
}

/// One operand of a task: either a literal numeric lexeme or a reference to
/// another task's not-yet-known result.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(String),
    Dep(TaskId),
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Literal(lexeme) => f.write_str(lexeme),
            Operand::Dep(id) => write!(f, "task:{}", id),
        }
    }
}

/// Stored task record. Retained for the life of the owning expression;
/// mutated only by the dispatcher.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub expression_id: String,
    pub op: Op,
    pub arg1: Operand,
    pub arg2: Operand,
    pub operation_time_ms: u64,
    pub status: TaskStatus,
    pub result: Option<f64>,
    pub error: Option<String>,
    /// Whether a queue entry for this task currently exists. Cleared at
    /// dequeue; a pending record with the flag clear is picked up by the
    /// post-report sweep.
    pub queued: bool,
    pub created_at: u64,
}

/// Evaluation tree retained per expression: the parsed AST with every
/// operator node annotated by its task. Immutable once built.
#[derive(Debug)]
pub enum TaskNode {
    Literal(f64),
    Op {
        task_id: TaskId,
        left: Box<TaskNode>,
        right: Box<TaskNode>,
    },
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
