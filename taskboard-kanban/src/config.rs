//! Ordering engine configuration using Figment
//!
//! Sources are merged in precedence order (later sources override earlier ones):
//! 1. Default values
//! 2. `ordering.toml` in the board directory
//! 3. `ordering.yaml` in the board directory
//! 4. Environment variables with the `TASKBOARD_` prefix

use crate::error::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// How a failed audit record affects an ordering move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// The audit record is part of the move; if it fails the move is rolled back
    #[default]
    Transactional,
    /// The move stands; a failed audit record is logged as a warning
    BestEffort,
}

/// Tunables of the ordering engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    pub audit_mode: AuditMode,
    /// Extra attempts for an operation that failed with a retryable error
    pub max_conflict_retries: u32,
    /// Back-off before the first retry, growing linearly per attempt
    pub retry_backoff_ms: u64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            audit_mode: AuditMode::default(),
            max_conflict_retries: 3,
            retry_backoff_ms: 10,
        }
    }
}

impl OrderingConfig {
    /// Prefix for environment overrides, e.g. `TASKBOARD_AUDIT_MODE=best_effort`
    pub const ENV_PREFIX: &'static str = "TASKBOARD_";

    /// Load configuration from defaults, files in `dir` (if any) and the environment
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(dir).extract()?;
        debug!(?config, "loaded ordering configuration");
        Ok(config)
    }

    /// Build the figment with all sources in precedence order
    pub fn figment(dir: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(dir) = dir {
            figment = figment
                .merge(Toml::file(dir.join("ordering.toml")))
                .merge(Yaml::file(dir.join("ordering.yaml")));
        }

        figment.merge(Env::prefixed(Self::ENV_PREFIX))
    }

    /// Back-off before retry number `attempt` (1-based)
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_defaults() {
        let config = OrderingConfig::load(None).unwrap();
        assert_eq!(config, OrderingConfig::default());
        assert_eq!(config.audit_mode, AuditMode::Transactional);
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("ordering.toml"),
            "audit_mode = \"best_effort\"\nmax_conflict_retries = 7\n",
        )
        .unwrap();
        std::fs::write(temp.path().join("ordering.yaml"), "retry_backoff_ms: 25\n").unwrap();

        let config = OrderingConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.audit_mode, AuditMode::BestEffort);
        assert_eq!(config.max_conflict_retries, 7);
        assert_eq!(config.retry_backoff_ms, 25);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("ordering.toml"),
            "max_conflict_retries = 7\n",
        )
        .unwrap();

        env::set_var("TASKBOARD_MAX_CONFLICT_RETRIES", "1");
        let config = OrderingConfig::load(Some(temp.path()));
        env::remove_var("TASKBOARD_MAX_CONFLICT_RETRIES");

        assert_eq!(config.unwrap().max_conflict_retries, 1);
    }

    #[test]
    #[serial]
    fn test_invalid_value_is_config_error() {
        env::set_var("TASKBOARD_AUDIT_MODE", "sometimes");
        let result = OrderingConfig::load(None);
        env::remove_var("TASKBOARD_AUDIT_MODE");

        assert!(matches!(result, Err(crate::KanbanError::Config(_))));
    }

    #[test]
    fn test_retry_backoff_grows() {
        let config = OrderingConfig::default();
        assert_eq!(config.retry_backoff(1), Duration::from_millis(10));
        assert_eq!(config.retry_backoff(3), Duration::from_millis(30));
    }
}
