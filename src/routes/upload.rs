//! Upload route — multipart CSV ingestion driving the cleaning pipeline.

use axum::extract::State;
use axum::extract::multipart::Multipart;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::services::pipeline::{self, SavedUpload};
use crate::state::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
}

/// `POST /api/upload-csv` — multipart fields `csvFiles` (repeated) and
/// `years` (JSON-encoded array of strings, index-aligned with the files).
pub async fn upload_csv(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    state
        .run_log
        .append("Starting new data ingestion & analysis run.")
        .await;

    let mut uploads: Vec<SavedUpload> = Vec::new();
    let mut years_raw: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": format!("malformed multipart body: {e}") })))
                    .into_response();
            }
        };

        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("csvFiles") => {
                let original_name = field
                    .file_name()
                    .map_or_else(|| "upload.csv".to_string(), ToString::to_string);
                let data = match field.bytes().await {
                    Ok(data) => data,
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "error": format!("failed to read upload {original_name}: {e}") })),
                        )
                            .into_response();
                    }
                };

                let raw_path = state.workspace.raw_upload_path(&original_name);
                if let Err(e) = tokio::fs::write(&raw_path, &data).await {
                    error!(error = %e, path = %raw_path.display(), "upload: raw file write failed");
                    return processing_failed(&state, &e.to_string()).await;
                }
                let cleaned_path = state.workspace.cleaned_path_for(&raw_path);
                uploads.push(SavedUpload { original_name, raw_path, cleaned_path });
            }
            Some("years") => {
                years_raw = field.text().await.ok();
            }
            // Unknown fields are ignored, matching the original form contract.
            _ => {}
        }
    }

    if uploads.is_empty() {
        state.run_log.append("ERROR: No files uploaded.").await;
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "No files uploaded." }))).into_response();
    }

    let years: Vec<String> = match years_raw.as_deref() {
        None | Some("") => Vec::new(),
        Some(raw) => match serde_json::from_str(raw) {
            Ok(years) => years,
            Err(_) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": "years must be a JSON array of strings." })))
                    .into_response();
            }
        },
    };

    let files = pipeline::pair_years(uploads, &years);

    // Hold the write gate for the whole clean/combine/summarize run so
    // concurrent chat calls never read a partially replaced dataset.
    let _write = state.dataset_gate.write().await;
    match pipeline::run(&state, &files).await {
        Ok(insights) => {
            (StatusCode::OK, Json(UploadResponse { success: true, message: "Files cleaned & combined.", insights }))
                .into_response()
        }
        Err(e) => processing_failed(&state, &e.to_string()).await,
    }
}

async fn processing_failed(state: &AppState, details: &str) -> Response {
    state.run_log.append(&format!("ERROR: {details}")).await;
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Processing failed", "details": details })))
        .into_response()
}
