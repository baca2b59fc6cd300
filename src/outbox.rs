//! Durable queue of score submissions the server did not acknowledge.
//!
//! A failed fire-and-forget submission lands here and is replayed later with
//! a bounded retry-with-backoff policy.

use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::api::QuizApi;
use crate::app_dirs::AppDirs;
use crate::config::Config;
use crate::question::CategoryId;

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create outbox directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored timestamp {0:?} is not RFC 3339")]
    Timestamp(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub score: u32,
    pub problem_solved: bool,
    pub category_id: Option<CategoryId>,
    pub queued_at: DateTime<Local>,
}

impl PendingSubmission {
    pub fn quiz_score(score: u32, category_id: Option<CategoryId>) -> Self {
        Self {
            score,
            problem_solved: false,
            category_id,
            queued_at: Local::now(),
        }
    }
}

/// A row of the outbox
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedSubmission {
    pub id: i64,
    pub submission: PendingSubmission,
    pub attempts: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Wait before retry number `retry` (0-based): `base_delay * 2^retry`
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub remaining: usize,
}

#[derive(Debug)]
pub struct Outbox {
    conn: Connection,
}

impl Outbox {
    /// Open the outbox at its default location under the state directory
    pub fn open_default() -> Result<Self, OutboxError> {
        let path = AppDirs::outbox_path().unwrap_or_else(|| PathBuf::from("kwiz_outbox.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OutboxError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, OutboxError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, OutboxError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS pending_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                score INTEGER NOT NULL,
                problem_solved BOOLEAN NOT NULL,
                category_id INTEGER,
                queued_at TEXT NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn enqueue(&self, submission: &PendingSubmission) -> Result<i64, OutboxError> {
        self.conn.execute(
            r#"
            INSERT INTO pending_submissions (score, problem_solved, category_id, queued_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                submission.score,
                submission.problem_solved,
                submission.category_id,
                submission.queued_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Queued submissions, oldest first
    pub fn pending(&self) -> Result<Vec<QueuedSubmission>, OutboxError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, score, problem_solved, category_id, queued_at, attempts, last_error
            FROM pending_submissions
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, Option<CategoryId>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut queued = Vec::new();
        for row in rows {
            let (id, score, problem_solved, category_id, queued_at, attempts, last_error) = row?;
            let queued_at = DateTime::parse_from_rfc3339(&queued_at)
                .map_err(|_| OutboxError::Timestamp(queued_at.clone()))?
                .with_timezone(&Local);
            queued.push(QueuedSubmission {
                id,
                submission: PendingSubmission {
                    score,
                    problem_solved,
                    category_id,
                    queued_at,
                },
                attempts,
                last_error,
            });
        }
        Ok(queued)
    }

    pub fn len(&self) -> Result<usize, OutboxError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM pending_submissions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, OutboxError> {
        Ok(self.len()? == 0)
    }

    pub fn remove(&self, id: i64) -> Result<(), OutboxError> {
        self.conn
            .execute("DELETE FROM pending_submissions WHERE id = ?1", [id])?;
        Ok(())
    }

    pub fn record_failure(&self, id: i64, attempts: u32, error: &str) -> Result<(), OutboxError> {
        self.conn.execute(
            "UPDATE pending_submissions SET attempts = attempts + ?1, last_error = ?2 WHERE id = ?3",
            params![attempts, error, id],
        )?;
        Ok(())
    }

    /// Replay queued submissions oldest first.
    ///
    /// Each entry gets up to `policy.max_attempts` tries with exponential
    /// backoff. The first entry that exhausts its attempts stops the flush; it
    /// and everything behind it stay queued for the next run.
    pub fn flush<A: QuizApi + ?Sized>(
        &self,
        api: &A,
        policy: &RetryPolicy,
    ) -> Result<FlushReport, OutboxError> {
        let queued = self.pending()?;
        let mut report = FlushReport::default();

        for (pos, entry) in queued.iter().enumerate() {
            let mut last_error = None;
            for attempt in 0..policy.max_attempts.max(1) {
                if attempt > 0 {
                    thread::sleep(policy.delay_for(attempt - 1));
                }
                match api.submit_progress(entry.submission.score, entry.submission.problem_solved) {
                    Ok(()) => {
                        last_error = None;
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(id = entry.id, attempt, "outbox replay failed: {e}");
                        last_error = Some(e.to_string());
                    }
                }
            }

            match last_error {
                None => {
                    self.remove(entry.id)?;
                    report.delivered += 1;
                    tracing::info!(id = entry.id, score = entry.submission.score, "queued score delivered");
                }
                Some(err) => {
                    self.record_failure(entry.id, policy.max_attempts.max(1), &err)?;
                    report.remaining = queued.len() - pos;
                    tracing::warn!(id = entry.id, "outbox flush stopped: {err}");
                    break;
                }
            }
        }

        Ok(report)
    }
}
