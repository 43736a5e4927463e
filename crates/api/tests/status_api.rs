//! Integration tests for the task status endpoint.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use dispatchd_db::models::task::TaskStatus;
use dispatchd_db::repositories::TaskRepo;
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Test: queued task is visible via /status/{id}
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn queued_task_status_is_returned(pool: SqlitePool) {
    let id = TaskRepo::enqueue(&pool, r#"{"eventID":"e-1","data":[]}"#)
        .await
        .unwrap();

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/status/{id}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"].as_i64(), Some(id));
    assert_eq!(json["status"], TaskStatus::QUEUED);
    assert!(json["job_id"].is_null());
}

// ---------------------------------------------------------------------------
// Test: completed task reads "200 OK"
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn completed_task_reads_200_ok(pool: SqlitePool) {
    let id = TaskRepo::enqueue(&pool, r#"{"eventID":"e-2","data":[]}"#)
        .await
        .unwrap();
    TaskRepo::claim_next(&pool).await.unwrap();
    TaskRepo::mark_succeeded(&pool, id, Some(77)).await.unwrap();

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/status/{id}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "200 OK");
    assert_eq!(json["job_id"].as_i64(), Some(77));
    assert!(json["completed_at"].is_string());
}

// ---------------------------------------------------------------------------
// Test: failed task carries the error text
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_task_carries_error_text(pool: SqlitePool) {
    let id = TaskRepo::enqueue(&pool, r#"{"eventID":"e-3","data":[]}"#)
        .await
        .unwrap();
    TaskRepo::claim_next(&pool).await.unwrap();
    TaskRepo::mark_failed(&pool, id, "download failed: HTTP 503")
        .await
        .unwrap();

    let app = common::build_test_app(pool);
    let json = body_json(get(app, &format!("/status/{id}")).await).await;

    assert_eq!(json["status"], TaskStatus::FAILED);
    assert_eq!(json["error"], "download failed: HTTP 503");
}

// ---------------------------------------------------------------------------
// Test: unknown task id returns 404
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_task_returns_404(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/status/9999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}
