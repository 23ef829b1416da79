//! Control Surface integration tests: a real `axum::Router` driven with
//! `tower::ServiceExt::oneshot`, no bound TCP listener required.

mod common;

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use spacesaver::config::Config;
use spacesaver::driver::DriverState;
use spacesaver::server::{build_router, AppContext};
use spacesaver_common::EntryId;
use spacesaver_db::Entry;

fn test_ctx() -> AppContext {
    AppContext {
        store: common::test_store(),
        config: Arc::new(Config::default()),
        driver_state: Arc::new(Mutex::new(DriverState::default())),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn sample_entry() -> Entry {
    Entry {
        uuid: EntryId::new(),
        name: "Test Movie".to_string(),
        hash: "abc".to_string(),
        path: "/media/test.mkv".to_string(),
        size: 1000,
    }
}

#[tokio::test]
async fn version_returns_crate_version() {
    let app = build_router(test_ctx());
    let response = app
        .oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn list_is_empty_with_no_entries() {
    let app = build_router(test_ctx());
    let response = app
        .oneshot(Request::builder().uri("/list").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn get_entry_not_found_returns_404() {
    let app = build_router(test_ctx());
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/list/{}", EntryId::new()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_uuid_returns_400() {
    let app = build_router(test_ctx());
    let response = app
        .oneshot(Request::builder().uri("/list/not-a-uuid").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn enqueue_unknown_entry_returns_404() {
    let app = build_router(test_ctx());
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/request/enqueue/{}", EntryId::new()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enqueue_pending_entry_returns_202() {
    let ctx = test_ctx();
    let entry = sample_entry();
    ctx.store.insert_entry_with_metadata_and_progress(&entry, &[]).unwrap();

    let app = build_router(ctx);
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/request/enqueue/{}", entry.uuid))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "queued");
}

#[tokio::test]
async fn enqueue_best_with_no_candidates_returns_404() {
    let app = build_router(test_ctx());
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/request/enqueue/best")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enqueue_best_picks_largest_entry() {
    let ctx = test_ctx();
    let small = sample_entry();
    let mut big = sample_entry();
    big.size = 99999;
    ctx.store.insert_entry_with_metadata_and_progress(&small, &[]).unwrap();
    ctx.store.insert_entry_with_metadata_and_progress(&big, &[]).unwrap();

    let app = build_router(ctx);
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/request/enqueue/best")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["uuid"], big.uuid.to_string());
}

#[tokio::test]
async fn status_reports_counts() {
    let ctx = test_ctx();
    let entry = sample_entry();
    ctx.store.insert_entry_with_metadata_and_progress(&entry, &[]).unwrap();

    let app = build_router(ctx);
    let response = app
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["counts"]["pending"], 1);
    assert!(body["current_file"].is_null());
}
