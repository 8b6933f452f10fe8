//! HTTP API and WebSocket endpoint.
//!
//! One axum router serves the REST surface under `/api` and the control
//! channel upgrade at `/ws`. Handlers stay thin: validate the request,
//! call into the registry/lifecycle layer, shape the JSON reply.

mod ws;

pub use ws::ws_handler;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::warn;

use visionmix_core::{RecordingConfig, RecordingId, SceneDraft, SceneId, ScenePatch, Settings,
    SourceDraft, StreamConfig, StreamId};
use visionmix_protocol::{
    HostInfo, MemoryUsage, PerformanceInfo, ResourceCounts, ServerMessage, ServerPayload,
    SystemStatsReport, TransitionRequest,
};

use crate::config::{ConfigError, ConfigStore};
use crate::discovery;
use crate::hub::BroadcastHub;
use crate::lifecycle;
use crate::registry::{DeviceAnnouncement, RegistryError, RegistryHandle};
use crate::stats::SystemMonitor;

/// Shared state for every handler: the registry handle, the broadcast
/// hub, the config store, and the process monitor. No ambient statics;
/// everything a handler touches arrives through here.
#[derive(Clone)]
pub struct AppState {
    pub registry: RegistryHandle,
    pub hub: BroadcastHub,
    pub config: Arc<ConfigStore>,
    pub monitor: Arc<Mutex<SystemMonitor>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(registry: RegistryHandle, hub: BroadcastHub, config: Arc<ConfigStore>) -> Self {
        Self {
            registry,
            hub,
            config,
            monitor: Arc::new(Mutex::new(SystemMonitor::new())),
            started_at: Instant::now(),
        }
    }
}

/// Builds the router with every route and the permissive CORS layer the
/// browser front-end needs.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(health))
        .route("/api/hardware", get(hardware_list))
        .route("/api/hardware/scan", post(hardware_scan))
        .route("/api/streams", get(streams_list))
        .route("/api/stream/start", post(stream_start))
        .route("/api/stream/stop/{id}", post(stream_stop))
        .route("/api/recordings", get(recordings_list))
        .route("/api/record/start", post(record_start))
        .route("/api/record/stop/{id}", post(record_stop))
        .route("/api/scenes", get(scenes_list).post(scene_save))
        .route(
            "/api/scenes/{id}",
            get(scene_get).put(scene_update).delete(scene_delete),
        )
        .route("/api/sources", get(sources_list).post(source_add))
        .route("/api/config", get(config_get).post(config_save))
        .route("/api/transition", post(transition))
        .route("/api/system/stats", get(system_stats))
        .route("/api/system/restart", post(system_restart))
        .route("/ws", get(ws_handler))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// Handler-level errors mapped onto HTTP statuses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::StreamNotFound(_)
            | RegistryError::RecordingNotFound(_)
            | RegistryError::SceneNotFound(_) => Self::NotFound(e.to_string()),
            RegistryError::ChannelClosed => Self::Internal(e.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(error) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "error": error })),
            )
                .into_response(),
            Self::Internal(detail) => {
                // The failure detail only leaves the process outside
                // production mode.
                let body = if production_mode() {
                    json!({ "success": false, "error": "Internal server error" })
                } else {
                    json!({
                        "success": false,
                        "error": "Internal server error",
                        "message": detail,
                    })
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

fn production_mode() -> bool {
    std::env::var("VISIONMIX_ENV").is_ok_and(|v| v == "production")
}

type ApiResult = Result<Json<Value>, ApiError>;

// ============================================================================
// Shared helpers
// ============================================================================

/// Registry counts plus the hub's client count.
pub(crate) async fn resource_counts(state: &AppState) -> ResourceCounts {
    let mut counts = state.registry.counts().await;
    counts.clients = state.hub.client_count().await;
    counts
}

/// Full stats payload for the stats endpoint and `get_status`.
pub(crate) async fn build_stats_report(state: &AppState) -> SystemStatsReport {
    let usage = state.monitor.lock().await.sample();
    let resources = resource_counts(state).await;

    SystemStatsReport {
        system: HostInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            uptime_secs: state.started_at.elapsed().as_secs(),
        },
        memory: MemoryUsage {
            rss_bytes: usage.memory_bytes,
            rss_mb: usage.memory_mb,
        },
        resources,
        performance: PerformanceInfo {
            cpu_percent: usage.cpu_percent,
            timestamp: Utc::now(),
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health(State(state): State<AppState>) -> Json<Value> {
    let resources = resource_counts(&state).await;
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": state.started_at.elapsed().as_secs(),
        "timestamp": Utc::now(),
        "resources": resources,
    }))
}

async fn hardware_list(State(state): State<AppState>) -> Json<Value> {
    let devices = state.registry.list_devices().await;
    let count = devices.len();
    Json(json!({ "success": true, "devices": devices, "count": count }))
}

async fn hardware_scan(State(state): State<AppState>) -> ApiResult {
    let devices = state
        .registry
        .register_devices(discovery::scan_devices(), DeviceAnnouncement::Scanned)
        .await?;
    Ok(Json(json!({ "success": true, "devices": devices })))
}

async fn streams_list(State(state): State<AppState>) -> Json<Value> {
    let streams = state.registry.list_streams().await;
    Json(json!({ "success": true, "streams": streams }))
}

#[derive(Debug, Deserialize)]
struct StartStreamBody {
    #[serde(default)]
    config: StreamConfig,
}

async fn stream_start(
    State(state): State<AppState>,
    Json(body): Json<StartStreamBody>,
) -> ApiResult {
    let stream = lifecycle::start_stream(&state.registry, body.config).await?;
    Ok(Json(json!({ "success": true, "streamId": stream.id })))
}

async fn stream_stop(State(state): State<AppState>, Path(id): Path<StreamId>) -> ApiResult {
    lifecycle::stop_stream(&state.registry, id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn recordings_list(State(state): State<AppState>) -> Json<Value> {
    let recordings = state.registry.list_recordings().await;
    Json(json!({ "success": true, "recordings": recordings }))
}

#[derive(Debug, Deserialize)]
struct StartRecordingBody {
    #[serde(default)]
    config: RecordingConfig,
}

async fn record_start(
    State(state): State<AppState>,
    Json(body): Json<StartRecordingBody>,
) -> ApiResult {
    let recording = lifecycle::start_recording(&state.registry, body.config).await?;
    Ok(Json(json!({ "success": true, "recordId": recording.id })))
}

async fn record_stop(State(state): State<AppState>, Path(id): Path<RecordingId>) -> ApiResult {
    lifecycle::stop_recording(&state.registry, id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn scenes_list(State(state): State<AppState>) -> Json<Value> {
    let scenes = state.registry.list_scenes().await;
    Json(json!({ "success": true, "scenes": scenes }))
}

async fn scene_get(State(state): State<AppState>, Path(id): Path<SceneId>) -> ApiResult {
    match state.registry.get_scene(id.clone()).await {
        Some(scene) => Ok(Json(json!({ "success": true, "scene": scene }))),
        None => Err(ApiError::NotFound(format!("scene not found: {id}"))),
    }
}

async fn scene_save(State(state): State<AppState>, Json(draft): Json<SceneDraft>) -> ApiResult {
    let scene = state.registry.save_scene(draft).await?;
    Ok(Json(json!({ "success": true, "scene": scene })))
}

async fn scene_update(
    State(state): State<AppState>,
    Path(id): Path<SceneId>,
    Json(patch): Json<ScenePatch>,
) -> ApiResult {
    let scene = state.registry.update_scene(id, patch).await?;
    Ok(Json(json!({ "success": true, "scene": scene })))
}

async fn scene_delete(State(state): State<AppState>, Path(id): Path<SceneId>) -> ApiResult {
    state.registry.delete_scene(id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn sources_list(State(state): State<AppState>) -> Json<Value> {
    let sources = state.registry.list_sources().await;
    Json(json!({ "success": true, "sources": sources }))
}

async fn source_add(State(state): State<AppState>, Json(draft): Json<SourceDraft>) -> ApiResult {
    let source = state.registry.add_source(draft).await?;
    Ok(Json(json!({ "success": true, "source": source })))
}

async fn config_get(State(state): State<AppState>) -> Json<Value> {
    let config = state.config.current().await;
    Json(json!({ "success": true, "config": config }))
}

async fn config_save(State(state): State<AppState>, Json(settings): Json<Settings>) -> ApiResult {
    state.config.save(settings).await?;
    Ok(Json(json!({ "success": true })))
}

async fn transition(
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult {
    lifecycle::perform_transition(&state.registry, request).await?;
    Ok(Json(json!({ "success": true })))
}

async fn system_stats(State(state): State<AppState>) -> Json<Value> {
    let stats = build_stats_report(&state).await;
    Json(json!({ "success": true, "stats": stats }))
}

async fn system_restart(State(state): State<AppState>) -> Json<Value> {
    warn!("System restart requested");

    state
        .hub
        .broadcast(&ServerMessage::new(ServerPayload::SystemRestarting {
            message: "System restart initiated".to_string(),
        }))
        .await;
    state.hub.close_all().await;
    state.registry.reset().await;

    Json(json!({ "success": true, "message": "System restart initiated" }))
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Endpoint not found" })),
    )
        .into_response()
}
