//! Audit log entries recorded for mutating operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One audit record: who did what to which entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique ID for this log entry (ULID format)
    pub id: String,

    /// When the operation occurred
    pub timestamp: DateTime<Utc>,

    /// Who performed the operation
    /// Format: "user_id" or "agent_name[session_id]"
    pub actor: String,

    /// Canonical op string (e.g., "add task", "move task")
    pub action: String,

    /// Kind of entity touched (e.g., "task")
    pub entity_type: String,

    /// Identifier of the entity touched
    pub entity_id: String,

    /// Action-specific details
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        metadata: Value,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            timestamp: Utc::now(),
            actor: actor.into(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            metadata,
        }
    }

    /// Create a log entry for a failed operation
    pub fn failure(
        actor: impl Into<String>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        error: &str,
    ) -> Self {
        Self::new(
            actor,
            action,
            entity_type,
            entity_id,
            serde_json::json!({ "error": error }),
        )
    }

    /// Whether this entry records a failure
    pub fn is_failure(&self) -> bool {
        self.metadata.get("error").is_some()
    }
}
