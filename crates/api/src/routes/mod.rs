pub mod health;
pub mod receive;
pub mod status;

use axum::Router;

use crate::state::AppState;

/// Build the service route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                health check (status, version, db_healthy)
/// /receive               POST — accept an event notification envelope
/// /status/{task_id}      GET  — task status lookup
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(receive::router())
        .merge(status::router())
}
