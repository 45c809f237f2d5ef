//! Task types: Task and field updates

use super::column::Column;
use super::ids::{BoardId, OrganizationId, TaskId};
use super::position::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task/card on a kanban board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub board_id: BoardId,
    pub organization_id: OrganizationId,
    pub title: String,
    #[serde(default)]
    pub description: String,

    /// Position = column + position key
    pub position: Position,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set when the task is soft-deleted; such tasks are invisible to ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task with the given title and position
    pub fn new(
        board_id: impl Into<BoardId>,
        organization_id: impl Into<OrganizationId>,
        title: impl Into<String>,
        position: Position,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            board_id: board_id.into(),
            organization_id: organization_id.into(),
            title: title.into(),
            description: String::new(),
            position,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the task soft-deleted
    pub fn deleted(mut self) -> Self {
        self.deleted_at = Some(Utc::now());
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the task is live and sits in `column` of `board_id`
    pub fn is_live_in(&self, board_id: &BoardId, column: Column) -> bool {
        !self.is_deleted() && &self.board_id == board_id && self.position.column == column
    }

    /// Apply non-ordering field changes, returning the names of changed fields
    pub fn apply(&mut self, update: &FieldUpdate) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if let Some(title) = update.title.as_ref().filter(|t| **t != self.title) {
            self.title = title.clone();
            changed.push("title");
        }
        if let Some(description) = update
            .description
            .as_ref()
            .filter(|d| **d != self.description)
        {
            self.description = description.clone();
            changed.push("description");
        }
        if !changed.is_empty() {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// Non-ordering fields that may change alongside (or instead of) a move
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}
