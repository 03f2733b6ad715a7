use super::protocol::{TaskPayload, TaskResult};
use super::queue::ReadyQueue;
use super::types::*;
use crate::config::OperationTimes;
use crate::parser::{self, AstNode, ParseError};

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("task not found: {0}")]
    TaskNotFound(String),
}

enum Eval {
    Value(f64),
    NotReady,
    Failed(String),
}

/// The expression decomposition and task-scheduling engine.
///
/// Owns every piece of shared state: the task store, the expression store,
/// the per-expression evaluation trees and the ready queue. All maps are
/// entry-level concurrent; cross-entry reads clone the record out first so
/// no two map guards are ever held at once.
pub struct TaskManager {
    tasks: DashMap<TaskId, TaskRecord>,
    expressions: DashMap<String, Expression>,
    trees: DashMap<String, Arc<TaskNode>>,
    ready: ReadyQueue,
    operation_times: OperationTimes,
    next_id: AtomicU64,
}

impl TaskManager {
    pub fn new(queue_capacity: usize, operation_times: OperationTimes) -> Arc<Self> {
        Arc::new(Self {
            tasks: DashMap::new(),
            expressions: DashMap::new(),
            trees: DashMap::new(),
            ready: ReadyQueue::new(queue_capacity),
            operation_times,
            next_id: AtomicU64::new(0),
        })
    }

    /// Identifiers are shared between expressions and tasks: unique for the
    /// process lifetime and strictly increasing.
    fn generate_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Parses the input, materializes one task per operator node and
    /// enqueues them. Parse failures never create an expression record.
    pub fn create_expression(&self, input: &str) -> Result<String, ParseError> {
        let ast = parser::parse(input)?;
        let id = self.generate_id();

        self.expressions.insert(
            id.clone(),
            Expression {
                id: id.clone(),
                input: input.to_string(),
                status: ExpressionStatus::Processing,
                result: None,
                error: None,
            },
        );

        let (tree, _) = self.plan_tasks(&ast, &id);
        self.trees.insert(id.clone(), Arc::new(tree));

        tracing::info!("Created expression {} for input {:?}", id, input);

        // A bare-number expression has no tasks and is already complete.
        self.evaluate_expression(&id);

        Ok(id)
    }

    /// Post-order planning pass. Children are planned first, so an operator
    /// child always has its task id assigned before the parent encodes the
    /// `task:<id>` operand.
    fn plan_tasks(&self, node: &AstNode, expression_id: &str) -> (TaskNode, Operand) {
        match node {
            AstNode::Number { lexeme, value } => {
                (TaskNode::Literal(*value), Operand::Literal(lexeme.clone()))
            }
            AstNode::BinOp { op, left, right } => {
                let (left_node, arg1) = self.plan_tasks(left, expression_id);
                let (right_node, arg2) = self.plan_tasks(right, expression_id);

                let task_id = TaskId(self.generate_id());
                let record = TaskRecord {
                    id: task_id.clone(),
                    expression_id: expression_id.to_string(),
                    op: *op,
                    arg1,
                    arg2,
                    operation_time_ms: self.operation_times.for_op(*op),
                    status: TaskStatus::Pending,
                    result: None,
                    error: None,
                    queued: false,
                    created_at: now_ms(),
                };

                tracing::debug!(
                    "Planned task {} ({} {} {}) for expression {}",
                    task_id,
                    record.arg1,
                    record.op,
                    record.arg2,
                    expression_id
                );

                self.tasks.insert(task_id.clone(), record);
                self.enqueue(&task_id);

                let tree = TaskNode::Op {
                    task_id: task_id.clone(),
                    left: Box::new(left_node),
                    right: Box::new(right_node),
                };
                (tree, Operand::Dep(task_id))
            }
        }
    }

    fn enqueue(&self, id: &TaskId) {
        let pushed = self.ready.try_push(id.clone());
        if !pushed {
            tracing::warn!("Ready queue full, task {} waits for the next sweep", id);
        }
        if let Some(mut entry) = self.tasks.get_mut(id) {
            entry.queued = pushed;
        }
    }

    /// Leases one ready task. Strictly non-blocking; returns `None` when the
    /// queue is empty or the head task still has an unresolved dependency
    /// (in which case the entry cycles to the tail so other work reaches the
    /// head first).
    pub fn next_task(&self) -> Option<TaskPayload> {
        loop {
            let id = self.ready.pop()?;

            let record = {
                let Some(mut entry) = self.tasks.get_mut(&id) else {
                    continue;
                };
                entry.queued = false;
                if entry.status != TaskStatus::Pending {
                    continue;
                }
                entry.clone()
            };

            // A failed expression's remaining tasks are dropped here rather
            // than handed to a worker.
            if self.expression_failed(&record.expression_id) {
                continue;
            }

            let (Some(arg1), Some(arg2)) =
                (self.resolve(&record.arg1), self.resolve(&record.arg2))
            else {
                self.enqueue(&id);
                return None;
            };

            if let Some(mut entry) = self.tasks.get_mut(&id) {
                entry.status = TaskStatus::Leased;
            }

            tracing::debug!(
                "Leased task {} ({} {} {}) of expression {}",
                id,
                arg1,
                record.op,
                arg2,
                record.expression_id
            );

            return Some(TaskPayload {
                id: record.id,
                arg1,
                arg2,
                operation: record.op.symbol().to_string(),
                operation_time: record.operation_time_ms,
            });
        }
    }

    /// A leased payload carries only literal operands: dependencies are
    /// substituted with the formatted result of the completed task.
    fn resolve(&self, operand: &Operand) -> Option<String> {
        match operand {
            Operand::Literal(lexeme) => Some(lexeme.clone()),
            Operand::Dep(id) => self
                .tasks
                .get(id)
                .and_then(|task| task.result)
                .map(|value| value.to_string()),
        }
    }

    /// Ingests a worker report. Last writer wins on repeated reports; the
    /// owning expression's terminal state is never overwritten.
    pub fn update_task_result(&self, result: TaskResult) -> Result<(), SchedulerError> {
        let expression_id = {
            let Some(mut entry) = self.tasks.get_mut(&result.id) else {
                return Err(SchedulerError::TaskNotFound(result.id.0.clone()));
            };

            if let Some(message) = &result.error {
                entry.error = Some(message.clone());
                entry.result = None;
                entry.status = TaskStatus::Failed;
            } else {
                entry.result = Some(result.result);
                entry.error = None;
                entry.status = TaskStatus::Completed;
            }
            entry.expression_id.clone()
        };

        match &result.error {
            Some(message) => {
                tracing::warn!(
                    "Task {} of expression {} failed: {}",
                    result.id,
                    expression_id,
                    message
                );
                self.fail_expression(&expression_id, message);
            }
            None => {
                tracing::debug!(
                    "Task {} of expression {} completed: {}",
                    result.id,
                    expression_id,
                    result.result
                );
                self.evaluate_expression(&expression_id);
            }
        }

        self.requeue_pending();
        Ok(())
    }

    /// Re-evaluates one expression after a report. No-op once terminal.
    fn evaluate_expression(&self, expression_id: &str) {
        match self.expressions.get(expression_id) {
            Some(expr) if !expr.status.is_terminal() => {}
            _ => return,
        }

        let Some(tree) = self.trees.get(expression_id).map(|t| t.value().clone()) else {
            tracing::error!("No evaluation tree for expression {}", expression_id);
            return;
        };

        match self.evaluate_node(&tree) {
            Eval::Value(value) => self.complete_expression(expression_id, value),
            Eval::Failed(message) => self.fail_expression(expression_id, &message),
            Eval::NotReady => {}
        }
    }

    /// An operator node resolves through its own task: the task's result
    /// already folds in the whole subtree, so children are never consulted.
    fn evaluate_node(&self, node: &TaskNode) -> Eval {
        match node {
            TaskNode::Literal(value) => Eval::Value(*value),
            TaskNode::Op { task_id, .. } => match self.tasks.get(task_id) {
                None => Eval::NotReady,
                Some(task) => {
                    if let Some(message) = &task.error {
                        Eval::Failed(message.clone())
                    } else if let Some(value) = task.result {
                        Eval::Value(value)
                    } else {
                        Eval::NotReady
                    }
                }
            },
        }
    }

    fn complete_expression(&self, expression_id: &str, value: f64) {
        if let Some(mut expr) = self.expressions.get_mut(expression_id) {
            if !expr.status.is_terminal() {
                expr.status = ExpressionStatus::Completed;
                expr.result = Some(value);
                tracing::info!("Expression {} completed with result {}", expression_id, value);
            }
        }
    }

    fn fail_expression(&self, expression_id: &str, message: &str) {
        if let Some(mut expr) = self.expressions.get_mut(expression_id) {
            if !expr.status.is_terminal() {
                expr.status = ExpressionStatus::Error;
                expr.error = Some(message.to_string());
                tracing::warn!("Expression {} failed: {}", expression_id, message);
            }
        }
    }

    /// Retries tasks that missed the queue because it was at capacity.
    /// Tasks of failed expressions stay out of the queue.
    fn requeue_pending(&self) {
        let candidates: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|entry| entry.status == TaskStatus::Pending && !entry.queued)
            .map(|entry| entry.id.clone())
            .collect();

        for id in candidates {
            let expression_id = match self.tasks.get(&id) {
                Some(entry) => entry.expression_id.clone(),
                None => continue,
            };
            if self.expression_failed(&expression_id) {
                continue;
            }
            if !self.ready.try_push(id.clone()) {
                break;
            }
            if let Some(mut entry) = self.tasks.get_mut(&id) {
                entry.queued = true;
            }
        }
    }

    fn expression_failed(&self, expression_id: &str) -> bool {
        self.expressions
            .get(expression_id)
            .map(|expr| expr.status == ExpressionStatus::Error)
            .unwrap_or(false)
    }

    pub fn get_expression(&self, id: &str) -> Option<Expression> {
        self.expressions.get(id).map(|entry| entry.value().clone())
    }

    pub fn list_expressions(&self) -> Vec<Expression> {
        self.expressions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn get_task(&self, id: &TaskId) -> Option<TaskRecord> {
        self.tasks.get(id).map(|entry| entry.value().clone())
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    pub fn queue_depth(&self) -> usize {
        self.ready.len()
    }

    /// (pending, leased, completed, failed)
    pub fn task_status_counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for entry in self.tasks.iter() {
            match entry.status {
                TaskStatus::Pending => counts.0 += 1,
                TaskStatus::Leased => counts.1 += 1,
                TaskStatus::Completed => counts.2 += 1,
                TaskStatus::Failed => counts.3 += 1,
            }
        }
        counts
    }

    /// (processing, completed, error)
    pub fn expression_status_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for entry in self.expressions.iter() {
            match entry.status {
                ExpressionStatus::Processing => counts.0 += 1,
                ExpressionStatus::Completed => counts.1 += 1,
                ExpressionStatus::Error => counts.2 += 1,
            }
        }
        counts
    }
}
