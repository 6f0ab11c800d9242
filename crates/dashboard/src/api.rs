//! HTTP control surface for a running dashboard session.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use common::filters::{FilterKey, FilterParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::session::{FilterUpdate, SessionError, SessionHandle};
use crate::sources::DashboardSnapshot;

/// Shared application state available to all handlers.
pub struct AppState {
    pub session: SessionHandle,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/snapshot", get(snapshot))
        .route("/api/filters", get(get_filters).post(set_filter))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: uptime,
    })
}

async fn snapshot(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.session.snapshot())
}

#[derive(Serialize)]
struct FiltersResponse {
    filters: FilterParams,
    url: String,
}

async fn get_filters(State(state): State<Arc<AppState>>) -> Json<FiltersResponse> {
    let snap = state.session.snapshot();
    Json(FiltersResponse {
        filters: snap.filters,
        url: snap.address,
    })
}

#[derive(Deserialize)]
pub struct SetFilterRequest {
    pub key: String,
    pub value: f64,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn set_filter(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetFilterRequest>,
) -> Result<Json<FilterUpdate>, (StatusCode, Json<MessageResponse>)> {
    let key: FilterKey = body.key.parse().map_err(|message| {
        (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse { message }),
        )
    })?;

    let update = state
        .session
        .set_filter(key, body.value)
        .await
        .map_err(|err: SessionError| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(MessageResponse {
                    message: err.to_string(),
                }),
            )
        })?;
    info!(key = %key, value = body.value, applied = update.applied, "filter update via api");
    Ok(Json(update))
}
