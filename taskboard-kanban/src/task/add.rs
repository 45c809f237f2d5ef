//! AddTask command

use crate::context::KanbanContext;
use crate::error::{KanbanError, Result};
use crate::store::Precondition;
use crate::types::{generate_between, BoardId, Column, Position, Task};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use taskboard_operations::{async_trait, operation, Execute, ExecutionResult, LogEntry};
use tracing::debug;

/// Add a new task at the end of a column
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddTask {
    /// Board the task belongs to
    pub board_id: BoardId,
    /// Initial column (defaults to todo)
    #[serde(default = "default_column")]
    pub column: Column,
    /// The task title (required)
    pub title: String,
    /// Detailed task description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_column() -> Column {
    Column::Todo
}

operation!(
    AddTask,
    verb = "add",
    noun = "task",
    description = "Create a new task at the end of a column"
);

impl AddTask {
    /// Create a new AddTask command for the todo column
    pub fn new(board_id: impl Into<BoardId>, title: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            column: default_column(),
            title: title.into(),
            description: None,
        }
    }

    /// Set the column
    pub fn in_column(mut self, column: Column) -> Self {
        self.column = column;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    async fn run(&self, ctx: &KanbanContext) -> Result<ExecutionResult<Value, KanbanError>> {
        if self.title.trim().is_empty() {
            return Err(KanbanError::invalid_value("title", "must not be empty"));
        }

        let store = ctx.store();
        let last = store
            .max_position_key_in_column(&self.board_id, self.column, None)
            .await?;
        let key = generate_between(last.as_ref(), None)?;

        let mut task = Task::new(
            self.board_id.clone(),
            ctx.caller().organization.clone(),
            self.title.trim(),
            Position::new(self.column, key.clone()),
        );
        if let Some(description) = &self.description {
            task = task.with_description(description.clone());
        }

        let expect = [Precondition::GapClear {
            board_id: self.board_id.clone(),
            column: self.column,
            lower: last,
            upper: None,
            exclude: task.id.clone(),
        }];
        store.insert_task(&task, &expect).await?;
        debug!(task = %task.id, column = %self.column, key = %key, "added task");

        Ok(ExecutionResult::Logged {
            value: serde_json::to_value(&task)?,
            log_entry: ctx.task_entry(
                "add task",
                &task.id,
                json!({
                    "board_id": task.board_id,
                    "column": self.column,
                    "position_key": key,
                }),
            ),
        })
    }
}

#[async_trait]
impl Execute<KanbanContext, KanbanError> for AddTask {
    async fn execute(&self, ctx: &KanbanContext) -> ExecutionResult<Value, KanbanError> {
        match self.run(ctx).await {
            Ok(result) => result,
            Err(error) => {
                let log_entry = LogEntry::failure(
                    ctx.caller().actor.as_str(),
                    "add task",
                    "board",
                    self.board_id.as_str(),
                    &error.to_string(),
                );
                ExecutionResult::Failed {
                    error,
                    log_entry: Some(log_entry),
                }
            }
        }
    }
}
