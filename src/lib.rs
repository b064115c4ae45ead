//! Court availability and booking service for PickleBall Court.

pub mod availability;
pub mod cache;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::cache::{AppCache, CacheStats};
use crate::config::Config;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
    pub config: Arc<Config>,
}

/// Build the full HTTP application
pub fn app(state: AppState) -> Router {
    let api = availability::router()
        .route("/health", get(health))
        .route("/cache/invalidate", post(invalidate_cache))
        .route("/cache/invalidate/fields/:id", post(invalidate_field_cache));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    cache: CacheStats,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.stats(),
    })
}

async fn invalidate_cache(State(state): State<AppState>) -> StatusCode {
    state.cache.invalidate_all();
    StatusCode::NO_CONTENT
}

async fn invalidate_field_cache(
    State(state): State<AppState>,
    Path(field_id): Path<Uuid>,
) -> StatusCode {
    state.cache.invalidate_field(field_id).await;
    StatusCode::NO_CONTENT
}
