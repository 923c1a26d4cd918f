//! In-memory metrics provider.
//!
//! Counts are lost on restart. Useful for tests and short-lived servers.

use super::{success_rate, MetricsProvider, MetricsSnapshot, TaskId};
use crate::error::{QuillError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Counters {
    completed: u64,
    succeeded: u64,
    /// Unfinished tasks in start order.
    in_flight: Vec<(TaskId, String)>,
    last_activity: Option<DateTime<Utc>>,
}

/// In-memory metrics provider.
#[derive(Default)]
pub struct MemoryMetrics {
    counters: RwLock<Counters>,
}

impl MemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> QuillError {
    QuillError::Metrics(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl MetricsProvider for MemoryMetrics {
    async fn task_started(&self, label: &str) -> Result<TaskId> {
        let mut counters = self.counters.write().map_err(poisoned)?;
        let id = Uuid::new_v4();
        counters.in_flight.push((id, label.to_string()));
        counters.last_activity = Some(Utc::now());
        Ok(id)
    }

    async fn task_finished(&self, id: TaskId, success: bool) -> Result<()> {
        let mut counters = self.counters.write().map_err(poisoned)?;
        let Some(pos) = counters.in_flight.iter().position(|(t, _)| *t == id) else {
            debug!("Ignoring finish for unknown task {}", id);
            return Ok(());
        };

        counters.in_flight.remove(pos);
        counters.completed += 1;
        if success {
            counters.succeeded += 1;
        }
        counters.last_activity = Some(Utc::now());
        Ok(())
    }

    async fn snapshot(&self) -> Result<MetricsSnapshot> {
        let counters = self.counters.read().map_err(poisoned)?;
        Ok(MetricsSnapshot {
            tasks_completed: counters.completed,
            tasks_succeeded: counters.succeeded,
            success_rate: success_rate(counters.succeeded, counters.completed),
            queue_length: counters.in_flight.len() as u64,
            current_task: counters.in_flight.last().map(|(_, label)| label.clone()),
            last_activity: counters.last_activity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_snapshot() {
        let snapshot = MemoryMetrics::new().snapshot().await.unwrap();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[tokio::test]
    async fn test_counts_and_queue() {
        let metrics = MemoryMetrics::new();

        let a = metrics.task_started("create_page").await.unwrap();
        let b = metrics.task_started("update_homepage").await.unwrap();
        let c = metrics.task_started("optimize_seo_content").await.unwrap();

        let snapshot = metrics.snapshot().await.unwrap();
        assert_eq!(snapshot.queue_length, 3);
        assert_eq!(snapshot.current_task.as_deref(), Some("optimize_seo_content"));

        metrics.task_finished(c, true).await.unwrap();
        metrics.task_finished(a, false).await.unwrap();
        metrics.task_finished(b, true).await.unwrap();

        let snapshot = metrics.snapshot().await.unwrap();
        assert_eq!(snapshot.tasks_completed, 3);
        assert_eq!(snapshot.tasks_succeeded, 2);
        assert_eq!(snapshot.success_rate, 66.7);
        assert_eq!(snapshot.queue_length, 0);
        assert!(snapshot.current_task.is_none());
        assert!(snapshot.last_activity.is_some());
    }

    #[tokio::test]
    async fn test_unknown_task_is_noop() {
        let metrics = MemoryMetrics::new();
        metrics.task_finished(Uuid::new_v4(), true).await.unwrap();
        assert_eq!(metrics.snapshot().await.unwrap().tasks_completed, 0);
    }

    #[tokio::test]
    async fn test_double_finish_counts_once() {
        let metrics = MemoryMetrics::new();
        let id = metrics.task_started("create_page").await.unwrap();
        metrics.task_finished(id, true).await.unwrap();
        metrics.task_finished(id, false).await.unwrap();

        let snapshot = metrics.snapshot().await.unwrap();
        assert_eq!(snapshot.tasks_completed, 1);
        assert_eq!(snapshot.success_rate, 100.0);
    }
}
