//! The `/receive` endpoint.
//!
//! The notification service pushes matched event envelopes here. The
//! envelope is validated, recorded as a queued task and processed later
//! by the worker; the response carries the task id for status polling.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use dispatchd_db::models::task::TaskStatus;
use dispatchd_db::repositories::TaskRepo;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Structural view of an inbound envelope, checked before enqueueing.
#[derive(Debug, Deserialize, Validate)]
struct ReceiveRequest {
    /// Destination-table records describing the ingest.
    #[validate(length(min = 1, message = "data must not be empty"))]
    data: Vec<Value>,
}

async fn receive(
    State(state): State<AppState>,
    Json(envelope): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request: ReceiveRequest = serde_json::from_value(envelope.clone())
        .map_err(|e| AppError::BadRequest(format!("malformed event envelope: {e}")))?;
    request
        .validate()
        .map_err(|e| AppError::BadRequest(format!("invalid event envelope: {e}")))?;

    let task_id = TaskRepo::enqueue(&state.pool, &envelope.to_string()).await?;

    tracing::info!(
        task_id,
        records = request.data.len(),
        "Event notification accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "task_id": task_id,
            "status": TaskStatus::QUEUED,
        })),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/receive", post(receive))
}
