//! JSONL audit sink: a global activity log plus one log per entity

use super::AuditSink;
use crate::error::Result;
use crate::store::file_stem;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use taskboard_operations::LogEntry;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Appends each record to `<entity_type>s/<entity_id>.jsonl` and then `activity/current.jsonl`.
/// A record lands in both logs or in neither.
#[derive(Debug, Clone)]
pub struct JsonlAuditSink {
    root: PathBuf,
}

impl JsonlAuditSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path to the current activity log
    pub fn activity_path(&self) -> PathBuf {
        self.root.join("activity").join("current.jsonl")
    }

    /// Path to one entity's log. Both parts must be plain file names.
    pub fn entity_log_path(&self, entity_type: &str, entity_id: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join(format!("{}s", file_stem(entity_type)?))
            .join(format!("{}.jsonl", file_stem(entity_id)?)))
    }

    /// Read activity log entries, newest first
    pub async fn read_activity(&self, limit: Option<usize>) -> Result<Vec<LogEntry>> {
        read_log(&self.activity_path(), limit).await
    }

    /// Read one entity's log entries, newest first
    pub async fn read_entity_log(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<LogEntry>> {
        read_log(&self.entity_log_path(entity_type, entity_id)?, None).await
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, entry: &LogEntry) -> Result<()> {
        let entity_path = self.entity_log_path(&entry.entity_type, &entry.entity_id)?;
        let mark = append_log(&entity_path, entry).await?;

        if let Err(e) = append_log(&self.activity_path(), entry).await {
            if let Err(undo) = truncate_log(&entity_path, mark).await {
                warn!(path = %entity_path.display(), error = %undo, "failed to withdraw entity log entry");
            }
            return Err(e);
        }
        Ok(())
    }
}

/// Append a log entry to a JSONL file. Returns the file length before the append.
/// A failed write leaves the file at that length.
async fn append_log(path: &Path, entry: &LogEntry) -> Result<u64> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let mark = file.metadata().await?.len();

    let written = async {
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        if let Err(undo) = file.set_len(mark).await {
            warn!(path = %path.display(), error = %undo, "failed to truncate partial log line");
        }
        return Err(e.into());
    }

    Ok(mark)
}

/// Cut a log back to `len` bytes
async fn truncate_log(path: &Path, len: u64) -> Result<()> {
    let file = fs::OpenOptions::new().write(true).open(path).await?;
    file.set_len(len).await?;
    Ok(())
}

async fn read_log(path: &Path, limit: Option<usize>) -> Result<Vec<LogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).await?;
    let mut entries: Vec<LogEntry> = content
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable log line");
                None
            }
        })
        .collect();

    // Reverse to get newest first
    entries.reverse();

    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    Ok(entries)
}
