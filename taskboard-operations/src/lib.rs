//! # Taskboard Operations
//!
//! This crate provides the `Operation` trait for defining board operations.
//! Operations are structs where the fields ARE the parameters - no duplication.
//!
//! ## Example
//!
//! ```ignore
//! use taskboard_operations::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct MoveTask {
//!     /// The task to move
//!     pub id: TaskId,
//!     /// Target column
//!     pub column: Column,
//! }
//!
//! operation!(MoveTask, verb = "move", noun = "task", description = "Move a task");
//!
//! #[async_trait]
//! impl Execute<KanbanContext, KanbanError> for MoveTask {
//!     async fn execute(&self, ctx: &KanbanContext) -> ExecutionResult<Value, KanbanError> {
//!         // implementation returns ExecutionResult::Logged or Unlogged
//!     }
//! }
//! ```

mod execution_result;
mod log;
mod operation;
mod processor;

pub use execution_result::ExecutionResult;
pub use log::LogEntry;
pub use operation::{Execute, Operation};
pub use processor::OperationProcessor;

// Re-export for use in implementations
pub use async_trait::async_trait;
pub use serde_json::Value;
