//! Durable task queue over the `tasks` table.
//!
//! The queue is the sole cross-worker coordination channel. Claiming a
//! task flips it to running and bumps the attempt counter in one
//! statement, so concurrent workers never double-claim; delivery is
//! at-least-once and handlers are idempotent.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rusqlite::{params, OptionalExtension};

use crate::domain::{DomainError, DomainResult};
use crate::ports::TaskRequest;

use super::database::Database;
use super::support::*;

#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub id: i64,
    pub request: TaskRequest,
    pub attempts: u32,
    pub max_attempts: u32,
}

#[derive(Clone)]
pub struct TaskQueue {
    db: Database,
}

impl TaskQueue {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn enqueue(&self, request: &TaskRequest) -> DomainResult<i64> {
        let now = Utc::now();
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO tasks (name, args_json, status, run_after, created_at) \
             VALUES (?1, ?2, 'pending', ?3, ?4)",
            params![request.name(), to_json(request), ts(now), ts(now)],
        )
        .map_err(|e| DomainError::repository("enqueue_task", e))?;
        Ok(conn.last_insert_rowid())
    }

    /// Claim the oldest ready task, if any. The UPDATE both marks it
    /// running and counts the attempt.
    pub fn claim_next(&self) -> DomainResult<Option<QueuedTask>> {
        let now = ts(Utc::now());
        let mut conn = self.db.conn();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::repository("claim_task", e))?;

        let candidate: Option<(i64, String, i64, i64)> = tx
            .query_row(
                "SELECT id, args_json, attempts, max_attempts FROM tasks \
                 WHERE status = 'pending' AND run_after <= ?1 \
                 ORDER BY id ASC LIMIT 1",
                params![now],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| DomainError::repository("claim_task", e))?;

        let Some((id, args_json, attempts, max_attempts)) = candidate else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE tasks SET status = 'running', claimed_at = ?1, attempts = attempts + 1 \
             WHERE id = ?2",
            params![now, id],
        )
        .map_err(|e| DomainError::repository("claim_task", e))?;
        tx.commit()
            .map_err(|e| DomainError::repository("claim_task", e))?;

        let request: TaskRequest = serde_json::from_str(&args_json)
            .map_err(|e| DomainError::repository("claim_task", e))?;

        Ok(Some(QueuedTask {
            id,
            request,
            attempts: attempts as u32 + 1,
            max_attempts: max_attempts as u32,
        }))
    }

    pub fn complete(&self, task_id: i64) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "UPDATE tasks SET status = 'completed', completed_at = ?1, error = NULL \
             WHERE id = ?2",
            params![ts(Utc::now()), task_id],
        )
        .map_err(|e| DomainError::repository("complete_task", e))?;
        Ok(())
    }

    /// Re-enqueue with a delay while attempts remain; otherwise mark
    /// the task failed for good.
    pub fn fail(
        &self,
        task: &QueuedTask,
        error: &str,
        retry_delay: std::time::Duration,
    ) -> DomainResult<bool> {
        let conn = self.db.conn();
        if task.attempts < task.max_attempts {
            let run_after: DateTime<Utc> = Utc::now()
                + ChronoDuration::from_std(retry_delay).unwrap_or_else(|_| ChronoDuration::seconds(1));
            conn.execute(
                "UPDATE tasks SET status = 'pending', run_after = ?1, error = ?2 WHERE id = ?3",
                params![ts(run_after), error, task.id],
            )
            .map_err(|e| DomainError::repository("fail_task", e))?;
            Ok(true)
        } else {
            conn.execute(
                "UPDATE tasks SET status = 'failed', completed_at = ?1, error = ?2 WHERE id = ?3",
                params![ts(Utc::now()), error, task.id],
            )
            .map_err(|e| DomainError::repository("fail_task", e))?;
            Ok(false)
        }
    }

    /// Terminal failure regardless of remaining attempts, for
    /// non-retryable errors.
    pub fn fail_permanently(&self, task_id: i64, error: &str) -> DomainResult<()> {
        let conn = self.db.conn();
        conn.execute(
            "UPDATE tasks SET status = 'failed', completed_at = ?1, error = ?2 WHERE id = ?3",
            params![ts(Utc::now()), error, task_id],
        )
        .map_err(|e| DomainError::repository("fail_task", e))?;
        Ok(())
    }

    pub fn pending_count(&self) -> DomainResult<u64> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE status = 'pending'",
            [],
            |row| row.get::<_, i64>(0),
        )
        .map(|c| c as u64)
        .map_err(|e| DomainError::repository("pending_tasks", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn queue() -> TaskQueue {
        TaskQueue::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn enqueue_claim_complete() {
        let queue = queue();
        queue
            .enqueue(&TaskRequest::ComputeShopScore {
                page_id: "p-1".into(),
            })
            .unwrap();
        assert_eq!(queue.pending_count().unwrap(), 1);

        let task = queue.claim_next().unwrap().unwrap();
        assert_eq!(task.attempts, 1);
        assert!(matches!(
            task.request,
            TaskRequest::ComputeShopScore { ref page_id } if page_id == "p-1"
        ));
        // no double-claim while running
        assert!(queue.claim_next().unwrap().is_none());

        queue.complete(task.id).unwrap();
        assert_eq!(queue.pending_count().unwrap(), 0);
    }

    #[test]
    fn failed_task_is_redelivered_until_attempts_exhaust() {
        let queue = queue();
        queue.enqueue(&TaskRequest::SnapshotDailyMetrics).unwrap();

        for attempt in 1..=3 {
            let task = queue.claim_next().unwrap().expect("task should be ready");
            assert_eq!(task.attempts, attempt);
            let requeued = queue.fail(&task, "boom", Duration::from_millis(0)).unwrap();
            assert_eq!(requeued, attempt < 3);
        }

        assert!(queue.claim_next().unwrap().is_none());
        assert_eq!(queue.pending_count().unwrap(), 0);
    }

    #[test]
    fn tasks_are_claimed_oldest_first() {
        let queue = queue();
        queue
            .enqueue(&TaskRequest::ComputeShopScore { page_id: "first".into() })
            .unwrap();
        queue
            .enqueue(&TaskRequest::ComputeShopScore { page_id: "second".into() })
            .unwrap();

        let task = queue.claim_next().unwrap().unwrap();
        assert!(matches!(
            task.request,
            TaskRequest::ComputeShopScore { ref page_id } if page_id == "first"
        ));
    }
}
