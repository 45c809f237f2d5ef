//! Task persistence
//!
//! The ordering engine reaches storage only through [`TaskStore`]. A store
//! answers point reads and per-column queries, and applies position writes
//! atomically together with their [`Precondition`]s: the read-neighbours /
//! compute-key / write sequence is optimistic, and a write whose
//! preconditions no longer hold fails with a retryable
//! [`KanbanError::Conflict`].

mod file;
mod memory;

pub use file::{file_stem, FileTaskStore, StoreLock};
pub use memory::MemoryTaskStore;

use crate::error::{KanbanError, Result};
use crate::types::{BoardId, Column, FieldUpdate, Position, PositionKey, Task, TaskId};
use async_trait::async_trait;

/// A condition the store re-checks under its write lock before applying a write
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// The task is still live at exactly this position
    Unchanged { task_id: TaskId, position: Position },

    /// No live task other than `exclude` has a key in the open interval
    /// `(lower, upper)` of the column; a missing bound is unbounded
    GapClear {
        board_id: BoardId,
        column: Column,
        lower: Option<PositionKey>,
        upper: Option<PositionKey>,
        exclude: TaskId,
    },

    /// No live task other than `exclude` holds `key` in the column
    KeyFree {
        board_id: BoardId,
        column: Column,
        key: PositionKey,
        exclude: TaskId,
    },
}

impl Precondition {
    /// Check against the full set of stored tasks, describing the violation on failure
    pub fn check<'a, I>(&self, tasks: I) -> std::result::Result<(), String>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        match self {
            Self::Unchanged { task_id, position } => {
                match tasks.into_iter().find(|t| &t.id == task_id) {
                    Some(t) if !t.is_deleted() && &t.position == position => Ok(()),
                    Some(t) if t.is_deleted() => Err(format!("task {task_id} was deleted")),
                    Some(_) => Err(format!("task {task_id} moved")),
                    None => Err(format!("task {task_id} disappeared")),
                }
            }
            Self::GapClear {
                board_id,
                column,
                lower,
                upper,
                exclude,
            } => match tasks.into_iter().find(|t| {
                &t.id != exclude
                    && t.is_live_in(board_id, *column)
                    && t.position.key.sorts_between(lower.as_ref(), upper.as_ref())
            }) {
                Some(t) => Err(format!(
                    "task {} was placed in the target gap of column {column}",
                    t.id
                )),
                None => Ok(()),
            },
            Self::KeyFree {
                board_id,
                column,
                key,
                exclude,
            } => match tasks.into_iter().find(|t| {
                &t.id != exclude && t.is_live_in(board_id, *column) && &t.position.key == key
            }) {
                Some(t) => Err(format!("key {key} is already held by task {}", t.id)),
                None => Ok(()),
            },
        }
    }
}

/// Check every precondition, mapping the first violation to a conflict on `task_id`
pub fn verify_preconditions<'a, I>(expect: &[Precondition], tasks: I, task_id: &TaskId) -> Result<()>
where
    I: IntoIterator<Item = &'a Task> + Clone,
{
    for precondition in expect {
        precondition
            .check(tasks.clone())
            .map_err(|reason| KanbanError::conflict(task_id, reason))?;
    }
    Ok(())
}

/// A conditional write of one task's `(column, position_key)`, together with
/// any field changes that must land in the same write
#[derive(Debug, Clone, PartialEq)]
pub struct PositionWrite {
    pub task_id: TaskId,
    pub position: Position,
    pub fields: FieldUpdate,
    pub expect: Vec<Precondition>,
}

/// Persistence collaborator of the ordering engine
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch a task by id, including soft-deleted ones
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>>;

    /// All live tasks of one board column, in no particular order
    async fn column_tasks(&self, board_id: &BoardId, column: Column) -> Result<Vec<Task>>;

    /// Insert a new task once `expect` holds
    async fn insert_task(&self, task: &Task, expect: &[Precondition]) -> Result<()>;

    /// Atomically check `write.expect`, then store the new position and fields.
    /// Returns the task as stored.
    async fn write_task_position(&self, write: &PositionWrite) -> Result<Task>;

    /// Apply non-ordering field changes
    async fn update_task_fields(&self, id: &TaskId, update: &FieldUpdate) -> Result<Task>;

    /// Live tasks of a column in display order
    async fn list_column(&self, board_id: &BoardId, column: Column) -> Result<Vec<Task>> {
        let mut tasks = self.column_tasks(board_id, column).await?;
        tasks.sort_by(|a, b| a.position.key.cmp(&b.position.key));
        Ok(tasks)
    }

    /// Largest key in the column, ignoring `exclude`
    async fn max_position_key_in_column(
        &self,
        board_id: &BoardId,
        column: Column,
        exclude: Option<&TaskId>,
    ) -> Result<Option<PositionKey>> {
        Ok(keys(self.column_tasks(board_id, column).await?, exclude).max())
    }

    /// Smallest key in the column, ignoring `exclude`
    async fn min_position_key_in_column(
        &self,
        board_id: &BoardId,
        column: Column,
        exclude: Option<&TaskId>,
    ) -> Result<Option<PositionKey>> {
        Ok(keys(self.column_tasks(board_id, column).await?, exclude).min())
    }

    /// The next key above `key` in the column, ignoring `exclude`
    async fn key_after(
        &self,
        board_id: &BoardId,
        column: Column,
        key: &PositionKey,
        exclude: Option<&TaskId>,
    ) -> Result<Option<PositionKey>> {
        Ok(keys(self.column_tasks(board_id, column).await?, exclude)
            .filter(|k| k > key)
            .min())
    }

    /// The next key below `key` in the column, ignoring `exclude`
    async fn key_before(
        &self,
        board_id: &BoardId,
        column: Column,
        key: &PositionKey,
        exclude: Option<&TaskId>,
    ) -> Result<Option<PositionKey>> {
        Ok(keys(self.column_tasks(board_id, column).await?, exclude)
            .filter(|k| k < key)
            .max())
    }
}

fn keys(tasks: Vec<Task>, exclude: Option<&TaskId>) -> impl Iterator<Item = PositionKey> + '_ {
    tasks
        .into_iter()
        .filter(move |t| exclude != Some(&t.id))
        .map(|t| t.position.key)
}
