//! Kanban ordering engine
//!
//! This crate keeps the tasks of each kanban column in a user-defined order
//! and moves tasks within and between columns without renumbering their
//! neighbours.
//!
//! ## Overview
//!
//! - **Fractional keys** - Every task carries a base-36 position key; a column
//!   lists by plain string order of those keys. A new key can always be made
//!   between any two others, so a move writes exactly one task.
//! - **Optimistic moves** - Neighbours are read, a key is computed, and the
//!   write is applied only if the neighbourhood is still as it was read.
//!   Otherwise the move fails with a retryable conflict and the processor
//!   runs it again.
//! - **Audited** - Every mutation produces a [`LogEntry`] for an injected
//!   [`audit::AuditSink`]. In transactional mode a move whose audit record
//!   fails is rolled back.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use taskboard_kanban::{
//!     task::{AddTask, MoveTask},
//!     Caller, Column, KanbanContext, KanbanOperationProcessor, OperationProcessor,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = KanbanContext::in_memory(Caller::new("alice", "acme"));
//! let processor = KanbanOperationProcessor::new();
//!
//! let first = processor.process(&AddTask::new("board", "Write codec"), &ctx).await?;
//! let second = processor.process(&AddTask::new("board", "Write docs"), &ctx).await?;
//!
//! // Put the second task in front of the first one
//! let second_id = second["id"].as_str().unwrap_or_default();
//! let first_id = first["id"].as_str().unwrap_or_default();
//! let moved = MoveTask::to_column(second_id, Column::Todo).with_after(first_id);
//! processor.process(&moved, &ctx).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Structure
//!
//! [`store::FileTaskStore`] and [`audit::JsonlAuditSink`] share a board
//! directory:
//!
//! ```text
//! board/
//! ├── .lock                    # Exclusive lock held by every store write
//! ├── ordering.toml            # Optional configuration (or ordering.yaml)
//! ├── tasks/
//! │   ├── {id}.json            # Task state
//! │   └── {id}.jsonl           # Per-task audit log
//! └── activity/
//!     └── current.jsonl        # Global audit log
//! ```

pub mod audit;
pub mod config;
mod context;
mod error;
mod processor;
pub mod store;
pub mod types;

// Command modules
pub mod column;
pub mod task;

// Re-export Execute trait and types from operations crate
pub use taskboard_operations::{
    async_trait, Execute, ExecutionResult, LogEntry, Operation, OperationProcessor,
};

pub use config::{AuditMode, OrderingConfig};
pub use context::KanbanContext;
pub use error::{ErrorKind, KanbanError, NeighborSide, Result};
pub use processor::KanbanOperationProcessor;

// Re-export commonly used types
pub use types::{
    generate_between, ActorId, BoardId, Caller, Column, KeyError, OrganizationId, Position,
    PositionKey, Task, TaskId,
};
