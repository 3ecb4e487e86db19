//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/ingestion` - Upload and catalogue queries
//! - `/api/view` - Raw file content
//! - `/api/datasets/{id}` - Detail payload and assistant chat
//! - `/api/health` - Health checks
//! - `/uploads` - Stored files, served as-is

pub mod datasets;
pub mod health;
pub mod ingestion;
pub mod view;

use axum::extract::DefaultBodyLimit;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Success payload: `{"success": true, "data": ...}`
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<ApiSuccess<T>> {
    Json(ApiSuccess {
        success: true,
        data,
    })
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let uploads = ServeDir::new(state.store.upload_dir());
    let body_limit = state.config.server.max_upload_bytes;
    let origins = state.config.server.cors_allowed_origins.clone();

    let router = Router::new()
        .merge(ingestion::router(state.clone()))
        .merge(view::router(state.clone()))
        .merge(datasets::router(state.clone()))
        .merge(health::router(state))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &origins)
}
