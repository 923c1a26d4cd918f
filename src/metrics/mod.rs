//! Task metrics backing the agent status snapshot.
//!
//! Every orchestrated operation is recorded as a task: started before its first
//! step, finished with its outcome. Providers are injected so tests and
//! deployments can pick storage independently.

mod memory;
mod sqlite;

pub use memory::MemoryMetrics;
pub use sqlite::SqliteMetrics;

use crate::config::Settings;
use crate::error::{QuillError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier handed out by `task_started`.
pub type TaskId = Uuid;

/// Aggregate view over recorded tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Tasks that have finished, successfully or not.
    pub tasks_completed: u64,
    /// Finished tasks that succeeded.
    pub tasks_succeeded: u64,
    /// Percentage of finished tasks that succeeded, one decimal.
    pub success_rate: f64,
    /// Tasks started but not yet finished.
    pub queue_length: u64,
    /// Label of the most recently started unfinished task.
    pub current_task: Option<String>,
    /// Most recent start or finish time.
    pub last_activity: Option<DateTime<Utc>>,
}

/// Success percentage rounded to one decimal; 0 when nothing has completed.
pub fn success_rate(succeeded: u64, completed: u64) -> f64 {
    if completed == 0 {
        return 0.0;
    }
    let rate = succeeded as f64 / completed as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// A store of task records.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Record the start of a task and return its ID.
    async fn task_started(&self, label: &str) -> Result<TaskId>;

    /// Record that a task finished. Unknown IDs are ignored.
    async fn task_finished(&self, id: TaskId, success: bool) -> Result<()>;

    /// Compute the current aggregate view.
    async fn snapshot(&self) -> Result<MetricsSnapshot>;
}

/// Create a metrics provider from settings.
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn MetricsProvider>> {
    match settings.metrics.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteMetrics::new(&settings.metrics_path())?)),
        "memory" => Ok(Arc::new(MemoryMetrics::new())),
        other => Err(QuillError::Config(format!(
            "Unknown metrics provider: {}. Use 'sqlite' or 'memory'.",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_rounding() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(2, 3), 66.7);
        assert_eq!(success_rate(1, 8), 12.5);
        assert_eq!(success_rate(5, 5), 100.0);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut settings = Settings::default();
        settings.metrics.provider = "redis".to_string();
        assert!(matches!(from_settings(&settings), Err(QuillError::Config(_))));
    }

    #[test]
    fn test_snapshot_serializes_optional_fields_as_null() {
        let json = serde_json::to_value(MetricsSnapshot::default()).unwrap();
        assert_eq!(json["current_task"], serde_json::Value::Null);
        assert_eq!(json["success_rate"], 0.0);
    }
}
