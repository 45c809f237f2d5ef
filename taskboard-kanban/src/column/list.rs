//! ListColumn command

use crate::context::KanbanContext;
use crate::error::{KanbanError, Result};
use crate::types::{BoardId, Column};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskboard_operations::{async_trait, operation, Execute, ExecutionResult};

/// List the live tasks of one board column in display order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListColumn {
    pub board_id: BoardId,
    pub column: Column,
}

operation!(
    ListColumn,
    verb = "list",
    noun = "column",
    description = "List the tasks of a column ordered by position key"
);

impl ListColumn {
    pub fn new(board_id: impl Into<BoardId>, column: Column) -> Self {
        Self {
            board_id: board_id.into(),
            column,
        }
    }
}

#[async_trait]
impl Execute<KanbanContext, KanbanError> for ListColumn {
    async fn execute(&self, ctx: &KanbanContext) -> ExecutionResult<Value, KanbanError> {
        let result: Result<Value> = async {
            let organization = &ctx.caller().organization;
            let tasks: Vec<_> = ctx
                .store()
                .list_column(&self.board_id, self.column)
                .await?
                .into_iter()
                .filter(|t| &t.organization_id == organization)
                .collect();

            Ok(serde_json::json!({
                "column": self.column,
                "tasks": tasks,
                "count": tasks.len()
            }))
        }
        .await;
        ExecutionResult::from_result(result)
    }
}
