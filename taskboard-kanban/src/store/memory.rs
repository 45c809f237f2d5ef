//! In-memory task store

use super::{verify_preconditions, Precondition, PositionWrite, TaskStore};
use crate::error::{KanbanError, Result};
use crate::types::{BoardId, Column, FieldUpdate, Task, TaskId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Task store held in process memory.
///
/// Every write takes the map's write lock, so precondition checks and the
/// write they guard are atomic with respect to other writers.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl MemoryTaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with tasks, bypassing preconditions
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasks: RwLock::new(tasks.into_iter().map(|t| (t.id.clone(), t)).collect()),
        }
    }

    /// Number of stored tasks, deleted ones included
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn column_tasks(&self, board_id: &BoardId, column: Column) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.is_live_in(board_id, column))
            .cloned()
            .collect())
    }

    async fn insert_task(&self, task: &Task, expect: &[Precondition]) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(KanbanError::conflict(&task.id, "task already exists"));
        }
        verify_preconditions(expect, tasks.values(), &task.id)?;
        tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn write_task_position(&self, write: &PositionWrite) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(&write.task_id) {
            return Err(KanbanError::task_not_found(&write.task_id));
        }
        verify_preconditions(&write.expect, tasks.values(), &write.task_id)?;

        let task = tasks
            .get_mut(&write.task_id)
            .ok_or_else(|| KanbanError::task_not_found(&write.task_id))?;
        task.position = write.position.clone();
        task.apply(&write.fields);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn update_task_fields(&self, id: &TaskId, update: &FieldUpdate) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| KanbanError::task_not_found(id))?;
        task.apply(update);
        Ok(task.clone())
    }
}
