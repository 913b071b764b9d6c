//! HTTP routes
//!
//! | Route                              | Method | Response                         |
//! |------------------------------------|--------|----------------------------------|
//! | `/camera/{id}/stream`              | GET    | `multipart/x-mixed-replace` JPEG |
//! | `/camera/{id}/snapshot`            | GET    | `image/jpeg`                     |
//! | `/camera/{id}/frame`               | GET    | JSON with a base64 JPEG          |
//! | `/camera/{id}/start_stream`        | POST   | JSON status                      |
//! | `/camera/{id}/stop_stream`         | POST   | JSON status                      |
//! | `/api/cameras/streams_status`      | GET    | JSON map of camera id to status  |
//! | `/health`                          | GET    | JSON                             |
//!
//! Access control is left to whatever sits in front of this router; the
//! camera directory decides which cameras exist.

use std::collections::{BTreeMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;

use super::config::ServerConfig;
use super::error::ApiError;
use crate::camera::{CameraDirectory, CameraId, CameraProfile};
use crate::distribution::{live_sequence, snapshot, MJPEG_CONTENT_TYPE};
use crate::registry::{StreamRegistry, StreamStatus};

/// Shared state for route handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StreamRegistry>,
    pub directory: Arc<dyn CameraDirectory>,
    pub config: Arc<ServerConfig>,
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/camera/{id}/stream", get(camera_stream))
        .route("/camera/{id}/snapshot", get(camera_snapshot))
        .route("/camera/{id}/frame", get(camera_frame))
        .route("/camera/{id}/start_stream", post(start_stream))
        .route("/camera/{id}/stop_stream", post(stop_stream))
        .route("/api/cameras/streams_status", get(streams_status))
        .route("/health", get(health))
        .with_state(state)
}

/// Resolve a camera that may be streamed
async fn streamable(state: &AppState, id: CameraId) -> Result<CameraProfile, ApiError> {
    if !state.config.streaming_enabled {
        return Err(ApiError::StreamingUnavailable);
    }

    let profile = state
        .directory
        .camera(id)
        .await
        .ok_or(ApiError::CameraNotFound(id))?;

    if !profile.has_stream_capability() {
        return Err(ApiError::NotConfigured(id));
    }

    Ok(profile)
}

/// Live MJPEG stream, starting the camera if it has no live worker
async fn camera_stream(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let id = CameraId(id);
    let profile = streamable(&state, id).await?;

    let worker = state.registry.get_or_start(&profile).await?;
    if !worker.is_alive() {
        let wait = state.config.registry.tuning.read_timeout;
        if !worker.wait_for_frame(wait).await {
            tracing::warn!(camera = %id, "No frame yet, live stream may end immediately");
        }
    }

    let quality = profile
        .stream_quality
        .map(|q| q.jpeg_quality())
        .unwrap_or(state.config.quality.live);

    tracing::debug!(camera = %id, quality = quality, "Live stream opened");

    let body = Body::from_stream(live_sequence(worker, quality).map(Ok::<_, Infallible>));

    Ok((
        [
            (header::CONTENT_TYPE, MJPEG_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache, no-store"),
        ],
        body,
    )
        .into_response())
}

/// Single JPEG of a live camera
async fn camera_snapshot(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let id = CameraId(id);
    streamable(&state, id).await?;

    let jpeg = snapshot(&state.registry, id, state.config.quality.snapshot).await?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response())
}

#[derive(Debug, Serialize)]
struct FrameResponse {
    camera: CameraId,
    /// Base64 JPEG, ready for a `data:image/jpeg;base64,` URL
    image: String,
    captured_at: Option<DateTime<Utc>>,
}

/// Latest frame as base64, for embedding in pages
async fn camera_frame(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<FrameResponse>, ApiError> {
    let id = CameraId(id);
    streamable(&state, id).await?;

    let worker = state
        .registry
        .get(id)
        .await
        .filter(|worker| worker.is_alive())
        .ok_or(ApiError::NoImage(id))?;

    let image = worker
        .latest_base64(state.config.quality.read)
        .ok_or(ApiError::NoImage(id))?;

    Ok(Json(FrameResponse {
        camera: id,
        image,
        captured_at: worker.last_frame_time(),
    }))
}

async fn start_stream(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = CameraId(id);
    let profile = streamable(&state, id).await?;

    state.registry.start_for(&profile).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Stream started",
    })))
}

async fn stop_stream(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = CameraId(id);

    if state.directory.camera(id).await.is_none() {
        return Err(ApiError::CameraNotFound(id));
    }

    let stopped = state.registry.stop_for(id).await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "stopped": stopped,
    })))
}

/// Status of every stream whose camera the directory knows
async fn streams_status(State(state): State<AppState>) -> Json<BTreeMap<CameraId, StreamStatus>> {
    let known: HashSet<CameraId> = state
        .directory
        .cameras()
        .await
        .iter()
        .map(|camera| camera.id)
        .collect();

    let mut status = state.registry.status_snapshot().await;
    status.retain(|id, _| known.contains(id));

    Json(status)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "streams": state.registry.len().await,
    }))
}
