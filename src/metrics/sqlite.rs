//! SQLite-based metrics provider.
//!
//! Task records survive restarts, so the success rate covers the lifetime of
//! the metrics database rather than a single process.

use super::{success_rate, MetricsProvider, MetricsSnapshot, TaskId};
use crate::error::{QuillError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    success INTEGER,
    recovered INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_tasks_finished_at ON tasks(finished_at);
"#;

/// SQLite-based metrics provider.
pub struct SqliteMetrics {
    conn: Mutex<Connection>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Bring databases created before the `recovered` column up to date.
fn migrate(conn: &Connection) -> Result<()> {
    let has_recovered: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('tasks') WHERE name = 'recovered'",
        [],
        |row| row.get(0),
    )?;
    if has_recovered == 0 {
        conn.execute_batch("ALTER TABLE tasks ADD COLUMN recovered INTEGER NOT NULL DEFAULT 0;")?;
        debug!("Added recovered column to tasks");
    }
    Ok(())
}

impl SqliteMetrics {
    /// Open (or create) the metrics database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        migrate(&conn)?;

        // A task still open here belongs to another handle, live or dead. It is
        // counted as failed until its owner, if still running, reports back.
        let abandoned = conn.execute(
            "UPDATE tasks SET finished_at = ?1, success = 0, recovered = 1 WHERE finished_at IS NULL",
            params![timestamp(Utc::now())],
        )?;
        if abandoned > 0 {
            warn!("Marked {} unfinished task(s) as failed", abandoned);
        }

        info!("Initialized SQLite metrics at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory metrics database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| QuillError::Metrics(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl MetricsProvider for SqliteMetrics {
    #[instrument(skip(self))]
    async fn task_started(&self, label: &str) -> Result<TaskId> {
        let conn = self.lock()?;
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO tasks (id, label, started_at) VALUES (?1, ?2, ?3)",
            params![id.to_string(), label, timestamp(Utc::now())],
        )?;

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn task_finished(&self, id: TaskId, success: bool) -> Result<()> {
        let conn = self.lock()?;

        // A recovered task may still be finished by the handle that started it.
        let updated = conn.execute(
            r#"
            UPDATE tasks SET finished_at = ?1, success = ?2, recovered = 0
            WHERE id = ?3 AND (finished_at IS NULL OR recovered = 1)
            "#,
            params![timestamp(Utc::now()), success, id.to_string()],
        )?;

        if updated == 0 {
            debug!("Ignoring finish for unknown task {}", id);
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<MetricsSnapshot> {
        let conn = self.lock()?;

        let (completed, succeeded, queued): (i64, i64, i64) = conn.query_row(
            r#"
            SELECT
                COUNT(finished_at),
                COALESCE(SUM(CASE WHEN success = 1 THEN 1 ELSE 0 END), 0),
                COUNT(*) - COUNT(finished_at)
            FROM tasks
            "#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let current_task: Option<String> = conn
            .query_row(
                "SELECT label FROM tasks WHERE finished_at IS NULL ORDER BY rowid DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let last_activity: Option<String> = conn.query_row(
            "SELECT MAX(COALESCE(finished_at, started_at)) FROM tasks",
            [],
            |row| row.get(0),
        )?;
        let last_activity = last_activity
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let completed = completed as u64;
        let succeeded = succeeded as u64;

        Ok(MetricsSnapshot {
            tasks_completed: completed,
            tasks_succeeded: succeeded,
            success_rate: success_rate(succeeded, completed),
            queue_length: queued as u64,
            current_task,
            last_activity,
        })
    }
}
