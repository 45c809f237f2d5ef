//! File-backed task store
//!
//! One pretty-printed JSON file per task under `tasks/`. Writes go through a
//! temp file and rename, and every mutation holds an exclusive lock file so
//! that precondition checks and writes are atomic across processes.

use super::{verify_preconditions, Precondition, PositionWrite, TaskStore};
use crate::error::{KanbanError, Result};
use crate::types::{BoardId, Column, FieldUpdate, Task, TaskId};
use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::trace;

/// Task store rooted at a board directory
#[derive(Debug, Clone)]
pub struct FileTaskStore {
    /// Path to the board directory
    root: PathBuf,
}

impl FileTaskStore {
    /// Create a store for the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // =========================================================================
    // Path helpers
    // =========================================================================

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to tasks directory
    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    /// Path to a task's JSON file
    pub fn task_path(&self, id: &TaskId) -> Result<PathBuf> {
        Ok(self.tasks_dir().join(format!("{}.json", file_stem(id.as_str())?)))
    }

    /// Path to the lock file
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    // =========================================================================
    // Task I/O
    // =========================================================================

    async fn read_task(&self, id: &TaskId) -> Result<Option<Task>> {
        // An id that cannot name a file cannot name a stored task either
        let Ok(path) = self.task_path(id) else {
            trace!(task = %id, "id is not a valid file name");
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn write_task(&self, task: &Task) -> Result<()> {
        let content = serde_json::to_string_pretty(task)?;
        atomic_write(&self.task_path(&task.id)?, content.as_bytes()).await
    }

    /// List all task IDs by reading the tasks directory
    pub async fn list_task_ids(&self) -> Result<Vec<TaskId>> {
        let tasks_dir = self.tasks_dir();
        if !tasks_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&tasks_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(TaskId::from_string(stem));
                }
            }
        }

        Ok(ids)
    }

    /// Read all tasks, deleted ones included
    pub async fn read_all_tasks(&self) -> Result<Vec<Task>> {
        let ids = self.list_task_ids().await?;
        let mut tasks = Vec::with_capacity(ids.len());

        for id in ids {
            if let Some(task) = self.read_task(&id).await? {
                tasks.push(task);
            }
        }

        Ok(tasks)
    }

    // =========================================================================
    // Locking
    // =========================================================================

    /// Try to acquire the exclusive store lock (non-blocking)
    pub async fn lock(&self) -> Result<StoreLock> {
        let lock_path = self.lock_path();
        fs::create_dir_all(&self.root).await?;

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(StoreLock { file }),
            Err(_) => Err(KanbanError::LockBusy),
        }
    }
}

#[async_trait]
impl TaskStore for FileTaskStore {
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        self.read_task(id).await
    }

    async fn column_tasks(&self, board_id: &BoardId, column: Column) -> Result<Vec<Task>> {
        let mut tasks = self.read_all_tasks().await?;
        tasks.retain(|t| t.is_live_in(board_id, column));
        Ok(tasks)
    }

    async fn insert_task(&self, task: &Task, expect: &[Precondition]) -> Result<()> {
        let _lock = self.lock().await?;
        let tasks = self.read_all_tasks().await?;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(KanbanError::conflict(&task.id, "task already exists"));
        }
        verify_preconditions(expect, &tasks, &task.id)?;
        self.write_task(task).await
    }

    async fn write_task_position(&self, write: &PositionWrite) -> Result<Task> {
        let _lock = self.lock().await?;
        let tasks = self.read_all_tasks().await?;
        let mut task = tasks
            .iter()
            .find(|t| t.id == write.task_id)
            .cloned()
            .ok_or_else(|| KanbanError::task_not_found(&write.task_id))?;
        verify_preconditions(&write.expect, &tasks, &write.task_id)?;

        task.position = write.position.clone();
        task.apply(&write.fields);
        task.updated_at = Utc::now();
        self.write_task(&task).await?;
        trace!(task = %task.id, position = ?task.position, "wrote task position");
        Ok(task)
    }

    async fn update_task_fields(&self, id: &TaskId, update: &FieldUpdate) -> Result<Task> {
        let _lock = self.lock().await?;
        let mut task = self
            .read_task(id)
            .await?
            .ok_or_else(|| KanbanError::task_not_found(id))?;
        if !task.apply(update).is_empty() {
            self.write_task(&task).await?;
        }
        Ok(task)
    }
}

/// Check that an id is usable as a single file name component.
///
/// Ids arrive from requests, so anything beyond `[A-Za-z0-9_-]` (path
/// separators, `..`) is rejected before it reaches the filesystem.
pub fn file_stem(id: &str) -> Result<&str> {
    if !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        Ok(id)
    } else {
        Err(KanbanError::invalid_value(
            "id",
            format!("{id:?} is not a valid file name"),
        ))
    }
}

/// RAII lock guard - releases on drop
pub struct StoreLock {
    file: std::fs::File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Atomic write via temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    // Write to temp file in same directory
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;

    // Rename (atomic on same filesystem)
    fs::rename(&temp_path, path).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Position, PositionKey};
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileTaskStore) {
        let temp = TempDir::new().unwrap();
        let store = FileTaskStore::new(temp.path().join(".taskboard"));
        (temp, store)
    }

    fn task(id: &str, column: Column, k: &str) -> Task {
        Task::new(
            "b1",
            "org1",
            id,
            Position::new(column, PositionKey::parse(k).unwrap()),
        )
        .with_id(id)
    }

    #[tokio::test]
    async fn test_paths() {
        let (temp, store) = setup();
        let root = temp.path().join(".taskboard");

        assert_eq!(store.root(), root);
        assert_eq!(store.tasks_dir(), root.join("tasks"));
        assert_eq!(
            store.task_path(&"t1".into()).unwrap(),
            root.join("tasks").join("t1.json")
        );
    }

    #[tokio::test]
    async fn test_ids_cannot_escape_tasks_dir() {
        let (temp, store) = setup();
        let root = temp.path().join(".taskboard");

        // A valid task file sitting next to tasks/, reachable as "../outside"
        std::fs::create_dir_all(&root).unwrap();
        let outside = task("outside", Column::Todo, "m");
        std::fs::write(
            root.join("outside.json"),
            serde_json::to_string(&outside).unwrap(),
        )
        .unwrap();

        for id in ["../outside", "..", "a/b", "a\\b", ""] {
            assert!(matches!(
                store.task_path(&id.into()),
                Err(KanbanError::InvalidValue { .. })
            ));
        }
        assert!(store.get_task(&"../outside".into()).await.unwrap().is_none());

        let escaping = task("../escaped", Column::Todo, "m");
        assert!(matches!(
            store.insert_task(&escaping, &[]).await,
            Err(KanbanError::InvalidValue { .. })
        ));
        assert!(!root.join("escaped.json").exists());
    }

    #[tokio::test]
    async fn test_task_io() {
        let (_temp, store) = setup();
        let t = task("t1", Column::Todo, "m");

        store.insert_task(&t, &[]).await.unwrap();

        let loaded = store.get_task(&t.id).await.unwrap().unwrap();
        assert_eq!(loaded, t);

        let ids = store.list_task_ids().await.unwrap();
        assert_eq!(ids, vec![t.id.clone()]);

        assert!(store.get_task(&"missing".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_conflicts() {
        let (_temp, store) = setup();
        let t = task("t1", Column::Todo, "m");
        store.insert_task(&t, &[]).await.unwrap();

        let err = store.insert_task(&t, &[]).await.unwrap_err();
        assert!(matches!(err, KanbanError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_position_write_checks_preconditions() {
        let (_temp, store) = setup();
        store
            .insert_task(&task("t1", Column::Todo, "c"), &[])
            .await
            .unwrap();
        store
            .insert_task(&task("t2", Column::Done, "m"), &[])
            .await
            .unwrap();

        let target = Position::new(Column::Done, PositionKey::parse("m").unwrap());
        let blocked = PositionWrite {
            task_id: "t1".into(),
            position: target.clone(),
            fields: FieldUpdate::default(),
            expect: vec![Precondition::GapClear {
                board_id: "b1".into(),
                column: Column::Done,
                lower: None,
                upper: None,
                exclude: "t1".into(),
            }],
        };
        assert!(store.write_task_position(&blocked).await.unwrap_err().is_retryable());

        let free = PositionWrite {
            fields: FieldUpdate::default(),
            expect: Vec::new(),
            ..blocked
        };
        let written = store.write_task_position(&free).await.unwrap();
        assert_eq!(written.position, target);
        assert_eq!(store.get_task(&"t1".into()).await.unwrap(), Some(written));

        let listed = store.list_column(&"b1".into(), Column::Done).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_update_task_fields() {
        let (_temp, store) = setup();
        store
            .insert_task(&task("t1", Column::Todo, "c"), &[])
            .await
            .unwrap();

        let update = FieldUpdate {
            title: Some("Renamed".into()),
            description: None,
        };
        let updated = store.update_task_fields(&"t1".into(), &update).await.unwrap();
        assert_eq!(updated.title, "Renamed");

        let loaded = store.get_task(&"t1".into()).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Renamed");
    }

    #[tokio::test]
    async fn test_locking() {
        let (_temp, store) = setup();

        // First lock should succeed
        let lock1 = store.lock().await.unwrap();

        // Second lock should fail (busy)
        let result = store.lock().await;
        assert!(matches!(result, Err(KanbanError::LockBusy)));

        // Writes report the busy lock as retryable
        let err = store
            .insert_task(&task("t1", Column::Todo, "m"), &[])
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        // After dropping, should be able to lock again
        drop(lock1);
        let _lock2 = store.lock().await.unwrap();
    }
}
