//! Chat and insights routes — intent-routed LLM endpoints.
//!
//! DESIGN
//! ======
//! Each request is stateless: the combined dataset file is re-read under the
//! dataset read gate, so an in-flight upload can never hand a chat call a
//! half-written file. Response bodies keep the shapes the web client
//! expects (`{success, text|error|insight, plotUrl?}`).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::dataset::{Dataset, DatasetError};
use crate::llm::LlmChat;
use crate::services::intent::{self, Intent};
use crate::services::plot::{self, PlotError};
use crate::services::query;
use crate::state::AppState;

const PLOT_INTRO_TEXT: &str = "Here is a data visualization based on your request:";
const PLOT_SPEC_APOLOGY: &str =
    "I couldn't understand your request to create a plot. Please try again with a more specific request.";

#[derive(Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
}

/// `POST /api/chat` — classify the message and answer or plot.
pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatBody>) -> Response {
    let message = body.message.trim();
    if message.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "error": "message is required" })))
            .into_response();
    }
    let Some(llm) = state.llm.clone() else {
        return llm_unavailable();
    };

    let _read = state.dataset_gate.read().await;
    let dataset = match Dataset::load(state.workspace.combined_path()).await {
        Ok(dataset) => dataset,
        Err(e) => {
            error!(error = %e, "chat: dataset unreadable");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Failed to read the dataset file." })),
            )
                .into_response();
        }
    };

    match intent::classify(&llm, message).await {
        Ok(Intent::Visualization) => visualization(&state, &llm, &dataset, message).await,
        Ok(Intent::Query) => match query::answer(&llm, &dataset, message).await {
            Ok(text) => (StatusCode::OK, Json(json!({ "success": true, "text": text }))).into_response(),
            Err(e) => processing_error(&e),
        },
        Err(e) => processing_error(&e),
    }
}

/// Plot path: resolve the spec, validate it against the header set, render.
async fn visualization(state: &AppState, llm: &Arc<dyn LlmChat>, dataset: &Dataset, message: &str) -> Response {
    let spec = match plot::resolve_spec(llm, message, &dataset.headers).await {
        Ok(spec) => spec,
        Err(PlotError::SpecParse(e)) => {
            error!(%e, "chat: plot spec unparseable");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "success": false, "text": PLOT_SPEC_APOLOGY })))
                .into_response();
        }
        Err(e) => return processing_error(&e),
    };

    if let Err(e) = plot::validate_spec(&spec, &dataset.headers) {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "success": false, "error": e.to_string() })))
            .into_response();
    }

    match plot::render(&state.plotter, &state.workspace, dataset, &spec).await {
        Ok(plot_url) => (
            StatusCode::OK,
            Json(json!({ "success": true, "text": PLOT_INTRO_TEXT, "plotUrl": plot_url })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "chat: plot generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "text": "Failed to generate plot.", "plotUrl": "" })),
            )
                .into_response()
        }
    }
}

/// `GET /api/insights` — executive summary of the current dataset.
pub async fn insights(State(state): State<AppState>) -> Response {
    let Some(llm) = state.llm.clone() else {
        return llm_unavailable();
    };

    let _read = state.dataset_gate.read().await;
    let dataset = match Dataset::load(state.workspace.combined_path()).await {
        Ok(dataset) => dataset,
        Err(e @ DatasetError::Empty(_)) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response();
        }
        Err(e) => {
            error!(error = %e, "insights: dataset unreadable");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to read the dataset file." })),
            )
                .into_response();
        }
    };

    match query::summarize(&llm, &dataset).await {
        Ok(insight) => (StatusCode::OK, Json(json!({ "success": true, "insight": insight }))).into_response(),
        Err(e) => {
            error!(error = %e, "insights: summary failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error generating insights from CSV." })),
            )
                .into_response()
        }
    }
}

fn llm_unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "success": false, "error": "LLM is not configured" })))
        .into_response()
}

fn processing_error(e: &impl std::fmt::Display) -> Response {
    error!(error = %e, "chat: processing failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "Error processing your request." })),
    )
        .into_response()
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod tests;
