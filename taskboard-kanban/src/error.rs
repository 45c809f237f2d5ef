//! Error types for the kanban ordering engine

use crate::types::KeyError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for kanban operations
pub type Result<T> = std::result::Result<T, KanbanError>;

/// Which neighbour reference of a move request was at fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSide {
    Before,
    After,
}

impl fmt::Display for NeighborSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NeighborSide::Before => "beforeId",
            NeighborSide::After => "afterId",
        })
    }
}

/// Coarse error category, for mapping onto a transport's status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Conflict,
    Internal,
}

/// Errors that can occur in kanban operations
#[derive(Debug, Error)]
pub enum KanbanError {
    /// Task missing, soft-deleted, or owned by another organization
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// A neighbour reference of a move request cannot be used
    #[error("invalid {side} reference {id}: {reason}")]
    InvalidReference {
        side: NeighborSide,
        id: String,
        reason: String,
    },

    /// Invalid field value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// The column changed between reading neighbours and writing
    #[error("position conflict for task {id}: {reason}")]
    Conflict { id: String, reason: String },

    /// Lock is held by another process
    #[error("lock busy - another operation in progress")]
    LockBusy,

    /// Audit emission failed and the move was rolled back
    #[error("audit record failed, move rolled back: {message}")]
    Audit { message: String },

    /// An engine invariant was violated
    #[error("internal error: {message}")]
    Internal { message: String },

    /// Malformed position key
    #[error("position key error: {0}")]
    Key(#[from] KeyError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KanbanError {
    /// Create a task not found error
    pub fn task_not_found(id: impl ToString) -> Self {
        Self::TaskNotFound { id: id.to_string() }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(
        side: NeighborSide,
        id: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidReference {
            side,
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::Conflict {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::LockBusy)
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidReference { .. } | Self::InvalidValue { .. } => ErrorKind::BadRequest,
            Self::Conflict { .. } | Self::LockBusy => ErrorKind::Conflict,
            Self::Audit { .. }
            | Self::Internal { .. }
            | Self::Key(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Internal,
        }
    }
}

impl From<figment::Error> for KanbanError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}
