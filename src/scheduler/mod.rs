//! Expression Scheduling Engine
//!
//! Turns each submitted infix expression into a dependency graph of binary
//! operations and distributes those operations to workers.
//!
//! ## Lifecycle
//! 1. **Submission**: the expression is parsed; one task per operator node
//!    is stored and enqueued on the bounded ready queue. Operands that
//!    depend on another operator are encoded symbolically as `task:<id>`.
//! 2. **Lease**: workers poll the dispatcher. A task whose dependencies are
//!    resolved is handed out with literal operands; an unresolved head entry
//!    cycles to the tail (cooperative deferral).
//! 3. **Report**: a worker posts a result or a compute error. Results feed
//!    the completion evaluator, which walks the expression's evaluation
//!    tree; errors fail the owning expression. Terminal expression states
//!    are sticky.
//!
//! ## Submodules
//! - **`types`**: task records, expression snapshots, the evaluation tree.
//! - **`queue`**: the bounded ready FIFO.
//! - **`manager`**: task factory, dispatcher and completion evaluator.
//! - **`protocol`**: HTTP API contracts for clients and workers.
//! - **`handlers`**: axum route handlers.
//! - **`worker`**: optional in-process worker pool.

pub mod handlers;
pub mod manager;
pub mod protocol;
pub mod queue;
pub mod types;
pub mod worker;

#[cfg(test)]
mod tests;
