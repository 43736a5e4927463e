//! Repository for the `tasks` table.

use dispatchd_core::types::DbId;

use crate::models::task::{Task, TaskStatus};
use crate::DbPool;

/// Column list for `tasks` queries.
const COLUMNS: &str = "id, event, status, error, job_id, created_at, updated_at, completed_at";

/// Provides read/write operations for dispatch tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new queued task for a received event envelope, returning
    /// the generated id.
    pub async fn enqueue(pool: &DbPool, event_json: &str) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO tasks (event, status) VALUES (?, ?) RETURNING id")
            .bind(event_json)
            .bind(TaskStatus::QUEUED)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest queued task, moving it to `processing`.
    ///
    /// Returns `None` when the queue is empty. A single UPDATE with a
    /// subselect keeps claim-and-transition one statement, so concurrent
    /// pollers cannot claim the same row twice.
    pub async fn claim_next(pool: &DbPool) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks \
             SET status = ?, updated_at = datetime('now') \
             WHERE id = ( \
                 SELECT id FROM tasks \
                 WHERE status = ? \
                 ORDER BY id ASC \
                 LIMIT 1 \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(TaskStatus::PROCESSING)
            .bind(TaskStatus::QUEUED)
            .fetch_optional(pool)
            .await
    }

    /// Record successful completion with the upstream upload job id.
    pub async fn mark_succeeded(
        pool: &DbPool,
        task_id: DbId,
        job_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks \
             SET status = ?, job_id = ?, error = NULL, \
                 updated_at = datetime('now'), completed_at = datetime('now') \
             WHERE id = ?",
        )
        .bind(TaskStatus::OK)
        .bind(job_id)
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed task along with the propagated error text.
    pub async fn mark_failed(pool: &DbPool, task_id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks \
             SET status = ?, error = ?, \
                 updated_at = datetime('now'), completed_at = datetime('now') \
             WHERE id = ?",
        )
        .bind(TaskStatus::FAILED)
        .bind(error)
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fetch a task by id.
    pub async fn get(pool: &DbPool, task_id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = ?");
        sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    /// Count tasks currently in the given status.
    pub async fn count_with_status(pool: &DbPool, status: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status = ?")
            .bind(status)
            .fetch_one(pool)
            .await
    }
}
