//! Audit sinks
//!
//! The engine records one [`LogEntry`] per mutation through an injected
//! [`AuditSink`]. Whether a failed record undoes the mutation is decided by
//! the caller (see [`crate::config::AuditMode`]), never by the sink.

mod jsonl;

pub use jsonl::JsonlAuditSink;

use crate::error::Result;
use async_trait::async_trait;
use taskboard_operations::LogEntry;
use tokio::sync::Mutex;

/// Destination for audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &LogEntry) -> Result<()>;
}

/// Sink that drops every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _entry: &LogEntry) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps records in memory, oldest first
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub async fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: &LogEntry) -> Result<()> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.record(&LogEntry::new("alice", "add task", "task", "t1", json!({})))
            .await
            .unwrap();
        sink.record(&LogEntry::new("alice", "move task", "task", "t1", json!({})))
            .await
            .unwrap();

        let actions: Vec<_> = sink.entries().await.into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec!["add task", "move task"]);
    }

    #[tokio::test]
    async fn test_noop_sink() {
        NoopAuditSink
            .record(&LogEntry::new("alice", "add task", "task", "t1", json!({})))
            .await
            .unwrap();
    }
}
