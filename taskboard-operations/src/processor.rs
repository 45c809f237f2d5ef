//! Operation processor trait

use crate::{Execute, Operation};
use async_trait::async_trait;
use serde_json::Value;

/// Runs operations against a context. Audit recording and retries live here,
/// not in the individual operations.
#[async_trait]
pub trait OperationProcessor<C, E>: Send + Sync
where
    C: Send + Sync,
{
    async fn process<O>(&self, operation: &O, ctx: &C) -> Result<Value, E>
    where
        O: Execute<C, E> + Operation + Send + Sync;
}
