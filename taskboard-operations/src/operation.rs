//! Operation metadata and execution traits

use crate::ExecutionResult;
use async_trait::async_trait;
use serde_json::Value;

/// Metadata every operation exposes: what it does and to which noun
pub trait Operation {
    /// The verb (e.g. "move")
    fn verb(&self) -> &'static str;

    /// The noun (e.g. "task")
    fn noun(&self) -> &'static str;

    /// Human readable description
    fn description(&self) -> &'static str;

    /// Canonical op string, e.g. "move task"
    fn op_string(&self) -> String {
        format!("{} {}", self.verb(), self.noun())
    }
}

/// Execute an operation against a context
#[async_trait]
pub trait Execute<C, E>: Send + Sync
where
    C: Send + Sync,
{
    async fn execute(&self, ctx: &C) -> ExecutionResult<Value, E>;
}

/// Implement [`Operation`] for a struct.
///
/// ```ignore
/// operation!(MoveTask, verb = "move", noun = "task", description = "Move a task");
/// ```
#[macro_export]
macro_rules! operation {
    ($ty:ty, verb = $verb:literal, noun = $noun:literal, description = $desc:literal $(,)?) => {
        impl $crate::Operation for $ty {
            fn verb(&self) -> &'static str {
                $verb
            }

            fn noun(&self) -> &'static str {
                $noun
            }

            fn description(&self) -> &'static str {
                $desc
            }
        }
    };
}
