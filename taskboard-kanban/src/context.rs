//! KanbanContext - collaborators for one request
//!
//! The context provides access to the store, the audit sink, configuration
//! and the caller. No business logic methods, just access primitives and
//! the tenant-scoping rule every command shares. Commands do all the work.

use crate::audit::{AuditSink, MemoryAuditSink, NoopAuditSink};
use crate::config::OrderingConfig;
use crate::error::{KanbanError, Result};
use crate::store::{MemoryTaskStore, TaskStore};
use crate::types::{Caller, Task, TaskId};
use serde_json::Value;
use std::sync::Arc;
use taskboard_operations::LogEntry;
use tracing::warn;

/// Context passed to every command - provides access, not logic
#[derive(Clone)]
pub struct KanbanContext {
    store: Arc<dyn TaskStore>,
    audit: Arc<dyn AuditSink>,
    config: OrderingConfig,
    caller: Caller,
}

impl KanbanContext {
    /// Create a context with default configuration
    pub fn new(store: Arc<dyn TaskStore>, audit: Arc<dyn AuditSink>, caller: Caller) -> Self {
        Self {
            store,
            audit,
            config: OrderingConfig::default(),
            caller,
        }
    }

    /// Context over an empty in-memory store that discards audit records
    pub fn in_memory(caller: Caller) -> Self {
        Self::new(
            Arc::new(MemoryTaskStore::new()),
            Arc::new(NoopAuditSink),
            caller,
        )
    }

    /// Context over an in-memory store, also returning a recording audit sink
    pub fn recording(store: Arc<dyn TaskStore>, caller: Caller) -> (Self, Arc<MemoryAuditSink>) {
        let audit = Arc::new(MemoryAuditSink::new());
        (Self::new(store, audit.clone(), caller), audit)
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: OrderingConfig) -> Self {
        self.config = config;
        self
    }

    /// Same collaborators, different caller
    pub fn for_caller(&self, caller: Caller) -> Self {
        Self {
            caller,
            ..self.clone()
        }
    }

    pub fn store(&self) -> &dyn TaskStore {
        self.store.as_ref()
    }

    pub fn audit(&self) -> &dyn AuditSink {
        self.audit.as_ref()
    }

    pub fn config(&self) -> &OrderingConfig {
        &self.config
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Read a task the caller may see.
    ///
    /// Missing, soft-deleted and other organizations' tasks all report
    /// `TaskNotFound`, so existence never leaks across tenants.
    pub async fn read_task(&self, id: &TaskId) -> Result<Task> {
        match self.store.get_task(id).await? {
            Some(task)
                if !task.is_deleted() && task.organization_id == self.caller.organization =>
            {
                Ok(task)
            }
            _ => Err(KanbanError::task_not_found(id)),
        }
    }

    /// Build an audit entry for a task, attributed to the caller
    pub fn task_entry(&self, action: &str, task_id: &TaskId, metadata: Value) -> LogEntry {
        LogEntry::new(
            self.caller.actor.as_str(),
            action,
            "task",
            task_id.as_str(),
            metadata,
        )
    }

    /// Record outside of any transaction; a failure degrades to a warning
    pub async fn record_best_effort(&self, entry: &LogEntry) {
        if let Err(error) = self.audit.record(entry).await {
            warn!(
                action = %entry.action,
                entity = %entry.entity_id,
                %error,
                "audit record failed; continuing without it"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, Position};

    fn caller(org: &str) -> Caller {
        Caller::new("alice", org)
    }

    #[tokio::test]
    async fn test_read_task_scopes_by_organization() {
        let mine = Task::new("b1", "org1", "mine", Position::in_column(Column::Todo));
        let theirs = Task::new("b2", "org2", "theirs", Position::in_column(Column::Todo));
        let gone = Task::new("b1", "org1", "gone", Position::in_column(Column::Todo)).deleted();
        let store = Arc::new(MemoryTaskStore::with_tasks([
            mine.clone(),
            theirs.clone(),
            gone.clone(),
        ]));
        let ctx = KanbanContext::new(store, Arc::new(NoopAuditSink), caller("org1"));

        assert_eq!(ctx.read_task(&mine.id).await.unwrap().title, "mine");
        assert!(matches!(
            ctx.read_task(&theirs.id).await,
            Err(KanbanError::TaskNotFound { .. })
        ));
        assert!(matches!(
            ctx.read_task(&gone.id).await,
            Err(KanbanError::TaskNotFound { .. })
        ));

        let other = ctx.for_caller(caller("org2"));
        assert_eq!(other.read_task(&theirs.id).await.unwrap().title, "theirs");
    }

    #[tokio::test]
    async fn test_task_entry_attributes_caller() {
        let ctx = KanbanContext::in_memory(caller("org1"));
        let entry = ctx.task_entry("move task", &"t1".into(), serde_json::json!({}));
        assert_eq!(entry.actor, "alice");
        assert_eq!(entry.entity_type, "task");
        assert_eq!(entry.entity_id, "t1");
    }
}
