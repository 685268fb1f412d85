//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the API endpoints and static plot-image serving under a single Axum
//! router. One canonical contract: `/api/*` with no user prefix. Generated
//! plot PNGs are served from the workspace images directory at `/images`.

pub mod agent;
pub mod download;
pub mod upload;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Multipart uploads carry whole CSV files; the axum default of 2 MB is too
/// small for real datasets.
const UPLOAD_BODY_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/upload-csv", post(upload::upload_csv))
        .route("/api/chat", post(agent::chat))
        .route("/api/insights", get(agent::insights))
        .route("/api/download-cleaned", get(download::download_cleaned))
        .route("/healthz", get(healthz))
        .nest_service("/images", ServeDir::new(state.workspace.images_dir()))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
