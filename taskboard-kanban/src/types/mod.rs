//! Core types for the kanban ordering engine

mod caller;
mod column;
mod ids;
mod position;
mod task;

// Re-export all types
pub use caller::Caller;
pub use column::Column;
pub use ids::{ActorId, BoardId, OrganizationId, TaskId};
pub use position::{generate_between, KeyError, Position, PositionKey};
pub use task::{FieldUpdate, Task};
