//! Execution result types for operations

use crate::LogEntry;

/// Result of executing an operation
///
/// Distinguishes between:
/// - Logged: the operation mutated state and the processor still has to record the entry
/// - Unlogged: read-only, or the operation already recorded its own entry
/// - Failed: Errors (optionally logged)
#[derive(Debug)]
pub enum ExecutionResult<T, E> {
    /// Operation succeeded and should be logged
    Logged { value: T, log_entry: LogEntry },
    /// Operation succeeded and nothing is left to log
    Unlogged { value: T },
    /// Operation failed
    Failed {
        error: E,
        log_entry: Option<LogEntry>,
    },
}

impl<T, E> ExecutionResult<T, E> {
    /// Extract the result (Ok or Err)
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Logged { value, .. } => Ok(value),
            Self::Unlogged { value } => Ok(value),
            Self::Failed { error, .. } => Err(error),
        }
    }

    /// Get the value and log entry separately
    pub fn split(self) -> (Result<T, E>, Option<LogEntry>) {
        match self {
            Self::Logged { value, log_entry } => (Ok(value), Some(log_entry)),
            Self::Unlogged { value } => (Ok(value), None),
            Self::Failed { error, log_entry } => (Err(error), log_entry),
        }
    }

    /// Check if this should be logged
    pub fn should_log(&self) -> bool {
        matches!(
            self,
            Self::Logged { .. }
                | Self::Failed {
                    log_entry: Some(_),
                    ..
                }
        )
    }

    /// Build a result from a plain `Result`, logging nothing
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Unlogged { value },
            Err(error) => Self::Failed {
                error,
                log_entry: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_logged() {
        let entry = LogEntry::new("alice", "add task", "task", "t1", json!({}));
        let result: ExecutionResult<u32, String> = ExecutionResult::Logged {
            value: 7,
            log_entry: entry,
        };
        assert!(result.should_log());

        let (value, entry) = result.split();
        assert_eq!(value, Ok(7));
        assert_eq!(entry.unwrap().action, "add task");
    }

    #[test]
    fn test_failed_without_entry_is_not_logged() {
        let result: ExecutionResult<u32, String> =
            ExecutionResult::from_result(Err("boom".to_string()));
        assert!(!result.should_log());
        assert_eq!(result.into_result(), Err("boom".to_string()));
    }
}
