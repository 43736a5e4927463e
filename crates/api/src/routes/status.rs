//! Task status lookup.

use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};
use dispatchd_core::error::CoreError;
use dispatchd_core::types::DbId;
use dispatchd_db::models::task::Task;
use dispatchd_db::repositories::TaskRepo;

use crate::error::AppResult;
use crate::state::AppState;

async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
) -> AppResult<Json<Task>> {
    let task = TaskRepo::get(&state.pool, task_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "task",
            id: task_id,
        })?;
    Ok(Json(task))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/status/{task_id}", get(get_status))
}
