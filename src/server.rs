//! HTTP Control Surface: thin handlers over the Admission layer (mutations)
//! and read-only projections over the Store (queries).

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use spacesaver_common::EntryId;
use spacesaver_db::{MetadataKind, Store};

use crate::admission::{self, AdmissionError};
use crate::config::Config;
use crate::driver::DriverState;

/// State shared across all route handlers.
#[derive(Clone)]
pub struct AppContext {
    pub store: Store,
    pub config: Arc<Config>,
    pub driver_state: Arc<Mutex<DriverState>>,
}

/// Build the Control Surface router per the external interfaces contract.
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/version", get(get_version))
        .route("/list", get(list_entries))
        .route("/list/:uuid", get(get_entry))
        .route("/status", get(get_status))
        .route("/request/enqueue/:uuid", post(enqueue))
        .route("/request/enqueue/best", post(enqueue_best))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Wraps application errors for `IntoResponse`, since neither type is local.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<spacesaver_common::Error> for AppError {
    fn from(e: spacesaver_common::Error) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: e.to_string() }
    }
}

impl From<AdmissionError> for AppError {
    fn from(e: AdmissionError) -> Self {
        let status = match e {
            AdmissionError::NotFound | AdmissionError::NoCandidates => StatusCode::NOT_FOUND,
            AdmissionError::AlreadyQueued | AdmissionError::AlreadyInProgress | AdmissionError::QueueActive => {
                StatusCode::CONFLICT
            }
        };
        Self { status, message: e.message().to_string() }
    }
}

fn parse_uuid(raw: &str) -> Result<EntryId, AppError> {
    raw.parse()
        .map_err(|_| AppError { status: StatusCode::BAD_REQUEST, message: "invalid uuid".to_string() })
}

async fn get_version() -> impl IntoResponse {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

#[derive(Serialize)]
struct EntrySummary {
    uuid: String,
    name: String,
    size: i64,
    status: String,
    progress: f64,
    codec: String,
}

fn best_known_codec(store: &Store, uuid: EntryId) -> String {
    if let Ok(Some(actual)) = store.get_metadata(uuid, MetadataKind::Actual) {
        if actual.codec != "Unknown" {
            return actual.codec;
        }
    }
    store
        .get_metadata(uuid, MetadataKind::Declared)
        .ok()
        .flatten()
        .map(|m| m.codec)
        .unwrap_or_else(|| "Unknown".to_string())
}

async fn list_entries(State(ctx): State<AppContext>) -> Result<impl IntoResponse, AppError> {
    let entries = ctx.store.list_entries()?;
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let progress = ctx.store.get_progress(entry.uuid)?;
        let Some(progress) = progress else { continue };
        out.push(EntrySummary {
            uuid: entry.uuid.to_string(),
            name: entry.name,
            size: entry.size,
            status: progress.status.as_str().to_string(),
            progress: progress.progress,
            codec: best_known_codec(&ctx.store, entry.uuid),
        });
    }
    Ok(Json(out))
}

async fn get_entry(State(ctx): State<AppContext>, Path(raw_uuid): Path<String>) -> Result<impl IntoResponse, AppError> {
    let uuid = parse_uuid(&raw_uuid)?;
    let entry = ctx
        .store
        .get_entry_by_uuid(uuid)?
        .ok_or_else(|| AppError { status: StatusCode::NOT_FOUND, message: "not_found".to_string() })?;
    let progress = ctx.store.get_progress(uuid)?;
    let metadata = ctx.store.get_all_metadata(uuid)?;

    Ok(Json(json!({
        "entry": entry,
        "progress": progress,
        "metadata": metadata,
    })))
}

async fn get_status(State(ctx): State<AppContext>) -> Result<impl IntoResponse, AppError> {
    let counts = ctx.store.count_by_status()?;
    let snapshot = crate::driver::snapshot(&ctx.driver_state);

    Ok(Json(json!({
        "counts": counts,
        "current_file": snapshot.current_entry.map(|e| json!({
            "uuid": e.uuid.to_string(),
            "name": e.name,
            "frame_current": snapshot.frame_current,
            "frame_total": snapshot.frame_total,
            "progress": snapshot.progress,
        })),
    })))
}

async fn enqueue(State(ctx): State<AppContext>, Path(raw_uuid): Path<String>) -> Result<impl IntoResponse, AppError> {
    let uuid = parse_uuid(&raw_uuid)?;
    admission::enqueue(&ctx.store, uuid)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "uuid": uuid.to_string(), "status": "queued" }))))
}

async fn enqueue_best(State(ctx): State<AppContext>) -> Result<impl IntoResponse, AppError> {
    let entry = admission::enqueue_best(&ctx.store)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "uuid": entry.uuid.to_string(), "name": entry.name, "size": entry.size })),
    ))
}

