//! MoveTask command

use crate::config::AuditMode;
use crate::context::KanbanContext;
use crate::error::{KanbanError, NeighborSide, Result};
use crate::store::{Precondition, PositionWrite};
use crate::types::{generate_between, Column, FieldUpdate, Position, PositionKey, Task, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use taskboard_operations::{async_trait, operation, Execute, ExecutionResult, LogEntry};
use tracing::{debug, error, info, warn};

/// Move a task to a column, optionally between two neighbours.
///
/// `before_id` is the task that should end up directly before the moved
/// task, `after_id` the one directly after it. Both must live in the target
/// column of the same board.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveTask {
    /// The task ID to move
    pub id: TaskId,
    /// The target column
    pub column: Column,
    /// Task that will precede the moved task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_id: Option<TaskId>,
    /// Task that will follow the moved task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_id: Option<TaskId>,
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

operation!(
    MoveTask,
    verb = "move",
    noun = "task",
    description = "Move a task to a column, optionally between two neighbouring tasks"
);

impl MoveTask {
    /// Create a MoveTask command to move to a column (at the end)
    pub fn to_column(id: impl Into<TaskId>, column: Column) -> Self {
        Self {
            id: id.into(),
            column,
            before_id: None,
            after_id: None,
            title: None,
            description: None,
        }
    }

    /// Place the task directly after `id`
    pub fn with_before(mut self, id: impl Into<TaskId>) -> Self {
        self.before_id = Some(id.into());
        self
    }

    /// Place the task directly before `id`
    pub fn with_after(mut self, id: impl Into<TaskId>) -> Self {
        self.after_id = Some(id.into());
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn fields(&self) -> FieldUpdate {
        FieldUpdate {
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }

    /// Load a neighbour reference and check it can anchor the move
    async fn resolve(
        &self,
        ctx: &KanbanContext,
        task: &Task,
        side: NeighborSide,
        id: Option<&TaskId>,
    ) -> Result<Option<Task>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let invalid = |reason: String| KanbanError::invalid_reference(side, id, reason);

        if id == &task.id {
            return Err(invalid("a task cannot be placed relative to itself".into()));
        }
        let neighbor = ctx
            .store()
            .get_task(id)
            .await?
            .ok_or_else(|| invalid("task does not exist".into()))?;
        if neighbor.is_deleted() {
            return Err(invalid("task is deleted".into()));
        }
        if neighbor.board_id != task.board_id {
            return Err(invalid("task belongs to a different board".into()));
        }
        if neighbor.position.column != self.column {
            return Err(invalid(format!(
                "task is in column {}, not {}",
                neighbor.position.column, self.column
            )));
        }
        Ok(Some(neighbor))
    }

    /// Work out the open interval the new key must fall in.
    ///
    /// Returns `(lower, upper, derived)`; `derived` is true when a bound was
    /// looked up from the column rather than named by the caller.
    async fn bounds(
        &self,
        ctx: &KanbanContext,
        task: &Task,
        before: Option<&Task>,
        after: Option<&Task>,
    ) -> Result<(Option<PositionKey>, Option<PositionKey>, bool)> {
        let store = ctx.store();
        let board = &task.board_id;
        let column = self.column;
        let exclude = Some(&task.id);

        Ok(match (before, after) {
            (Some(before), Some(after)) => {
                if before.position.key >= after.position.key {
                    return Err(KanbanError::invalid_reference(
                        NeighborSide::After,
                        &after.id,
                        format!("task does not sort after {}", before.id),
                    ));
                }
                (
                    Some(before.position.key.clone()),
                    Some(after.position.key.clone()),
                    false,
                )
            }
            (Some(before), None) => {
                let key = &before.position.key;
                let upper = store.key_after(board, column, key, exclude).await?;
                (Some(key.clone()), upper, true)
            }
            (None, Some(after)) => {
                let key = &after.position.key;
                let lower = store.key_before(board, column, key, exclude).await?;
                (lower, Some(key.clone()), true)
            }
            (None, None) => {
                let lower = store
                    .max_position_key_in_column(board, column, exclude)
                    .await?;
                (lower, None, true)
            }
        })
    }

    /// Change only non-ordering fields
    async fn update_fields(
        &self,
        ctx: &KanbanContext,
        task: Task,
    ) -> Result<ExecutionResult<Value, KanbanError>> {
        let fields = self.fields();
        let mut preview = task.clone();
        let changed = preview.apply(&fields);
        if changed.is_empty() {
            debug!(task = %task.id, "move request changes nothing");
            return Ok(ExecutionResult::Unlogged {
                value: serde_json::to_value(&task)?,
            });
        }

        let updated = ctx.store().update_task_fields(&task.id, &fields).await?;
        Ok(ExecutionResult::Logged {
            value: serde_json::to_value(&updated)?,
            log_entry: ctx.task_entry("update task", &task.id, json!({ "fields": changed })),
        })
    }

    /// Undo a committed write after its audit record failed, restoring both
    /// the position and any fields the write changed
    async fn roll_back(
        &self,
        ctx: &KanbanContext,
        task: &Task,
        write: &PositionWrite,
        cause: KanbanError,
    ) -> KanbanError {
        let previous = &task.position;
        let restore = PositionWrite {
            task_id: task.id.clone(),
            position: previous.clone(),
            fields: FieldUpdate {
                title: Some(task.title.clone()),
                description: Some(task.description.clone()),
            },
            expect: vec![
                Precondition::Unchanged {
                    task_id: task.id.clone(),
                    position: write.position.clone(),
                },
                Precondition::KeyFree {
                    board_id: task.board_id.clone(),
                    column: previous.column,
                    key: previous.key.clone(),
                    exclude: task.id.clone(),
                },
            ],
        };

        match ctx.store().write_task_position(&restore).await {
            Ok(_) => {
                warn!(task = %task.id, error = %cause, "audit record failed, move rolled back");
                KanbanError::Audit {
                    message: cause.to_string(),
                }
            }
            Err(rollback) => {
                error!(
                    task = %task.id,
                    error = %cause,
                    rollback_error = %rollback,
                    "audit record failed and the move could not be rolled back"
                );
                KanbanError::internal(format!(
                    "move of task {} could not be rolled back after audit failure ({cause}): {rollback}",
                    task.id
                ))
            }
        }
    }

    async fn run(&self, ctx: &KanbanContext) -> Result<ExecutionResult<Value, KanbanError>> {
        let task = ctx.read_task(&self.id).await?;
        let before = self
            .resolve(ctx, &task, NeighborSide::Before, self.before_id.as_ref())
            .await?;
        let after = self
            .resolve(ctx, &task, NeighborSide::After, self.after_id.as_ref())
            .await?;

        let column_changed = task.position.column != self.column;
        if before.is_none() && after.is_none() && !column_changed {
            return self.update_fields(ctx, task).await;
        }

        let (lower, upper, derived) = self
            .bounds(ctx, &task, before.as_ref(), after.as_ref())
            .await?;
        let key = generate_between(lower.as_ref(), upper.as_ref())?;
        if !key.sorts_between(lower.as_ref(), upper.as_ref()) {
            error!(
                task = %task.id,
                key = %key,
                lower = ?lower,
                upper = ?upper,
                "generated position key is outside its bounds"
            );
            return Err(KanbanError::internal(format!(
                "generated key {key} does not sort between {lower:?} and {upper:?}"
            )));
        }
        debug!(task = %task.id, column = %self.column, key = %key, "resolved position key");

        let mut expect: Vec<Precondition> = [&before, &after]
            .into_iter()
            .flatten()
            .map(|n| Precondition::Unchanged {
                task_id: n.id.clone(),
                position: n.position.clone(),
            })
            .collect();
        expect.push(if derived {
            Precondition::GapClear {
                board_id: task.board_id.clone(),
                column: self.column,
                lower: lower.clone(),
                upper: upper.clone(),
                exclude: task.id.clone(),
            }
        } else {
            Precondition::KeyFree {
                board_id: task.board_id.clone(),
                column: self.column,
                key: key.clone(),
                exclude: task.id.clone(),
            }
        });

        let write = PositionWrite {
            task_id: task.id.clone(),
            position: Position::new(self.column, key.clone()),
            fields: self.fields(),
            expect,
        };
        let moved = ctx.store().write_task_position(&write).await?;

        let (action, mut metadata) = if column_changed {
            (
                "move task",
                json!({
                    "old_column": task.position.column,
                    "new_column": self.column,
                    "position_key": key,
                }),
            )
        } else {
            ("update task", json!({ "position_key": key }))
        };
        let changed: Vec<&str> = [
            ("title", task.title != moved.title),
            ("description", task.description != moved.description),
        ]
        .into_iter()
        .filter_map(|(field, differs)| differs.then_some(field))
        .collect();
        if !changed.is_empty() {
            metadata["fields"] = json!(changed);
        }
        let entry = ctx.task_entry(action, &task.id, metadata);

        let pending = match ctx.config().audit_mode {
            AuditMode::Transactional => {
                if let Err(cause) = ctx.audit().record(&entry).await {
                    return Err(self.roll_back(ctx, &task, &write, cause).await);
                }
                None
            }
            AuditMode::BestEffort => Some(entry),
        };
        info!(
            task = %task.id,
            from = %task.position.column,
            to = %self.column,
            key = %key,
            "task moved"
        );

        let value = serde_json::to_value(&moved)?;
        Ok(match pending {
            Some(log_entry) => ExecutionResult::Logged { value, log_entry },
            None => ExecutionResult::Unlogged { value },
        })
    }
}

#[async_trait]
impl Execute<KanbanContext, KanbanError> for MoveTask {
    async fn execute(&self, ctx: &KanbanContext) -> ExecutionResult<Value, KanbanError> {
        match self.run(ctx).await {
            Ok(result) => result,
            Err(error) => {
                let log_entry = LogEntry::failure(
                    ctx.caller().actor.as_str(),
                    "move task",
                    "task",
                    self.id.as_str(),
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
