//! Task entity model.

use dispatchd_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Queue/terminal states stored in `tasks.status`.
///
/// Terminal states are HTTP-style status strings so an operator polling
/// the status endpoint sees `"200 OK"` on success, matching the upstream
/// platform's task-table convention.
pub struct TaskStatus;

impl TaskStatus {
    pub const QUEUED: &'static str = "queued";
    pub const PROCESSING: &'static str = "processing";
    pub const OK: &'static str = "200 OK";
    pub const FAILED: &'static str = "500 Internal Server Error";
}

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    /// Raw event envelope JSON as received on `/receive`.
    pub event: String,
    pub status: String,
    pub error: Option<String>,
    /// Upstream upload job id, set when a handler produced a new upload.
    pub job_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}
