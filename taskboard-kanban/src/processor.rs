//! Operation processor for kanban commands

use crate::config::OrderingConfig;
use crate::context::KanbanContext;
use crate::error::{KanbanError, Result};
use serde_json::Value;
use std::time::Instant;
use taskboard_operations::{async_trait, Execute, Operation, OperationProcessor};
use tracing::{debug, info, warn};

/// Runs kanban operations, retrying retryable failures and recording any
/// audit entry the operation left for it (best-effort).
///
/// Every retry re-runs the whole operation, so a move whose neighbours
/// changed underneath it re-reads them and computes a fresh key.
#[derive(Debug, Clone)]
pub struct KanbanOperationProcessor {
    config: OrderingConfig,
}

impl KanbanOperationProcessor {
    /// Create a processor with default retry settings
    pub fn new() -> Self {
        Self::from_config(OrderingConfig::default())
    }

    /// Create a processor using the retry settings of `config`
    pub fn from_config(config: OrderingConfig) -> Self {
        Self { config }
    }
}

impl Default for KanbanOperationProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationProcessor<KanbanContext, KanbanError> for KanbanOperationProcessor {
    async fn process<O>(&self, operation: &O, ctx: &KanbanContext) -> Result<Value>
    where
        O: Execute<KanbanContext, KanbanError> + Operation + Send + Sync,
    {
        let op = operation.op_string();
        let start = Instant::now();
        let mut retries = 0u32;

        loop {
            let (result, log_entry) = operation.execute(ctx).await.split();

            if let Err(error) = &result {
                if error.is_retryable() && retries < self.config.max_conflict_retries {
                    retries += 1;
                    warn!(op = %op, retries, %error, "retrying operation");
                    tokio::time::sleep(self.config.retry_backoff(retries)).await;
                    continue;
                }
            }

            if let Some(entry) = &log_entry {
                ctx.record_best_effort(entry).await;
            }

            let duration_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => info!(op = %op, retries, duration_ms, "operation completed"),
                Err(error) => debug!(op = %op, retries, duration_ms, %error, "operation failed"),
            }
            return result;
        }
    }
}
