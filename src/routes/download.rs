//! Download route — serve the most recently cleaned dataset.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use crate::state::AppState;

/// `GET /api/download-cleaned` — most-recently-modified cleaned file as an
/// attachment; 404 when no cleaned dataset exists yet.
pub async fn download_cleaned(State(state): State<AppState>) -> Response {
    let _read = state.dataset_gate.read().await;

    let latest = match state.workspace.latest_cleaned_file() {
        Ok(latest) => latest,
        Err(e) => {
            error!(error = %e, "download: cleaned dir unreadable");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Failed to read cleaned datasets." })))
                .into_response();
        }
    };
    let Some(path) = latest else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "No cleaned datasets found." }))).into_response();
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, path = %path.display(), "download: cleaned file unreadable");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Failed to read cleaned datasets." })))
                .into_response();
        }
    };

    let filename = path
        .file_name()
        .map_or_else(|| "cleaned.csv".to_string(), |n| n.to_string_lossy().into_owned());

    (
        [
            (CONTENT_TYPE, "text/csv".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
#[path = "download_test.rs"]
mod tests;
