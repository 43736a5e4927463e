//! Background task runner.
//!
//! Polls the `tasks` table for queued work and routes each claimed task's
//! event through the [`EventRouter`]. A single long-lived Tokio task;
//! handler execution is synchronous within the loop.

use std::sync::Arc;
use std::time::Duration;

use dispatchd_db::models::task::Task;
use dispatchd_db::repositories::TaskRepo;
use dispatchd_db::DbPool;
use dispatchd_events::event::IngestEvent;
use dispatchd_events::router::EventRouter;
use tokio_util::sync::CancellationToken;

/// Default polling interval for the runner loop.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Claims queued tasks and dispatches their events.
pub struct TaskRunner {
    pool: DbPool,
    router: Arc<EventRouter>,
    poll_interval: Duration,
}

impl TaskRunner {
    /// Create a runner with the default 1-second poll interval.
    pub fn new(pool: DbPool, router: Arc<EventRouter>) -> Self {
        Self {
            pool,
            router,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the polling loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            handlers = self.router.len(),
            "Task runner started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Task runner shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.drain().await {
                        tracing::error!(error = %e, "Task polling cycle failed");
                    }
                }
            }
        }
    }

    /// One polling cycle: claim and process tasks until the queue is
    /// empty. Returns the number of tasks processed.
    pub async fn drain(&self) -> Result<usize, sqlx::Error> {
        let mut processed = 0;
        while let Some(task) = TaskRepo::claim_next(&self.pool).await? {
            tracing::info!(task_id = task.id, "Task claimed");
            self.process(task).await?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Process one claimed task and record its terminal status.
    async fn process(&self, task: Task) -> Result<(), sqlx::Error> {
        let event = match parse_event(&task.event) {
            Ok(event) => event,
            Err(reason) => {
                tracing::warn!(task_id = task.id, error = %reason, "Unparseable event envelope");
                return TaskRepo::mark_failed(&self.pool, task.id, &reason).await;
            }
        };

        match self.router.route(&event).await {
            Ok(outcome) => {
                tracing::info!(
                    task_id = task.id,
                    handlers_run = outcome.handlers_run,
                    job_id = outcome.job_id,
                    "Task completed"
                );
                TaskRepo::mark_succeeded(&self.pool, task.id, outcome.job_id).await
            }
            Err(e) => {
                tracing::error!(task_id = task.id, error = %e, "Task failed");
                TaskRepo::mark_failed(&self.pool, task.id, &e.to_string()).await
            }
        }
    }
}

/// Parse a stored envelope into an [`IngestEvent`].
fn parse_event(event_json: &str) -> Result<IngestEvent, String> {
    let envelope: serde_json::Value =
        serde_json::from_str(event_json).map_err(|e| format!("invalid event JSON: {e}"))?;
    IngestEvent::from_envelope(envelope).map_err(|e| format!("invalid event envelope: {e}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
