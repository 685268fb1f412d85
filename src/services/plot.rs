//! Plot specification — LLM-resolved chart parameters, validated before use.
//!
//! DESIGN
//! ======
//! A second LLM call turns the user message plus the dataset headers into a
//! `{chart_type, columns, title}` JSON object. Models wrap JSON in markdown
//! fences often enough that fences are stripped before parsing. The prompt
//! rules alone are not trusted: the parsed spec is validated against the
//! closed chart-type enum (via serde) and the actual header set, and a
//! spec naming unknown columns is rejected with a typed error instead of
//! being forwarded to the plotter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::llm_max_tokens;
use crate::dataset::{Dataset, DatasetError};
use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Message};
use crate::tools::{Plotter, ToolError};
use crate::workspace::{Workspace, now_ms};

// =============================================================================
// TYPES
// =============================================================================

/// Closed set of chart types the plot generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
    Scatter,
    Histogram,
    Box,
    Heatmap,
    Area,
    Donut,
    Bubble,
    Radar,
    StackedArea,
    Hbar,
}

impl ChartType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Scatter => "scatter",
            Self::Histogram => "histogram",
            Self::Box => "box",
            Self::Heatmap => "heatmap",
            Self::Area => "area",
            Self::Donut => "donut",
            Self::Bubble => "bubble",
            Self::Radar => "radar",
            Self::StackedArea => "stacked_area",
            Self::Hbar => "hbar",
        }
    }
}

/// The tuple handed to the plotting tool.
#[derive(Debug, Clone, Deserialize)]
pub struct PlotSpec {
    pub chart_type: ChartType,
    pub columns: Vec<String>,
    #[serde(default)]
    pub title: String,
}

impl PlotSpec {
    /// Title to render: the spec's own, or `Plot of {col1 vs col2 …}`.
    #[must_use]
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() { format!("Plot of {}", self.columns.join(" vs ")) } else { self.title.clone() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// The model's reply was not a parseable spec object. Also covers a
    /// parseable object with an unknown `chart_type`, which serde rejects.
    #[error("plot spec was not valid JSON: {0}")]
    SpecParse(String),

    /// The spec parsed but names columns the dataset does not have.
    #[error("invalid plot spec: {0}")]
    InvalidSpec(String),

    #[error("plot tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

// =============================================================================
// SPEC RESOLUTION
// =============================================================================

/// Ask the LLM for a plot spec and parse its reply.
///
/// # Errors
///
/// Returns [`PlotError::Llm`] if the call fails and [`PlotError::SpecParse`]
/// if the reply is not a valid spec object.
pub async fn resolve_spec(llm: &Arc<dyn LlmChat>, message: &str, headers: &[String]) -> Result<PlotSpec, PlotError> {
    let response = llm
        .chat(llm_max_tokens(), "", &[Message::user(spec_prompt(message, headers))])
        .await?;

    let raw = strip_code_fence(&response.text);
    let spec: PlotSpec = serde_json::from_str(&raw).map_err(|e| {
        warn!(reply = %response.text, "plot spec parse failed");
        PlotError::SpecParse(e.to_string())
    })?;
    info!(chart_type = spec.chart_type.as_str(), columns = ?spec.columns, "plot spec resolved");
    Ok(spec)
}

/// Remove a surrounding markdown code fence (with optional `json` tag).
/// Only the outermost fence is stripped; backticks inside the payload,
/// such as in a title string, are left alone.
#[must_use]
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim().to_string()
}

/// Reject specs whose columns are not in the dataset header.
///
/// # Errors
///
/// Returns [`PlotError::InvalidSpec`] for an empty column list or any
/// column absent from `headers`.
pub fn validate_spec(spec: &PlotSpec, headers: &[String]) -> Result<(), PlotError> {
    if spec.columns.is_empty() {
        return Err(PlotError::InvalidSpec("spec names no columns".into()));
    }
    for column in &spec.columns {
        if !headers.iter().any(|h| h == column) {
            return Err(PlotError::InvalidSpec(format!("unknown column: {column}")));
        }
    }
    Ok(())
}

// =============================================================================
// RENDERING
// =============================================================================

/// Invoke the plotter and return the public URL of the generated PNG.
///
/// # Errors
///
/// Returns [`PlotError::Tool`] if the plotter fails and
/// [`PlotError::Dataset`] if the rows cannot be serialized.
pub async fn render(
    plotter: &Arc<dyn Plotter>,
    workspace: &Workspace,
    dataset: &Dataset,
    spec: &PlotSpec,
) -> Result<String, PlotError> {
    let filename = format!("plot_{}.png", now_ms());
    let out = workspace.plot_path(&filename);
    let rows_json = dataset.to_json_pretty()?;

    plotter
        .plot(&out, spec.chart_type.as_str(), &spec.columns, &spec.display_title(), &rows_json)
        .await?;

    Ok(format!("/images/{filename}"))
}

// =============================================================================
// PROMPT
// =============================================================================

fn spec_prompt(message: &str, headers: &[String]) -> String {
    format!(
        r#"Based on the user request and the following columns from the dataset:
[{columns}], identify the most suitable chart type, relevant columns, and a title.

Rules:
1. Supported chart types: "line", "bar", "pie", "scatter", "histogram", "box", "heatmap", "area",
    "donut", "bubble", "radar", "stacked_area", "hbar".
2. Numeric requirements:
   - Must have at least one numeric column for: ["line", "bar", "scatter", "bubble", "stacked_area", "radar"].
   - If no numeric column exists, do NOT choose these. Instead, pick from ["pie", "histogram", "box", "heatmap", "area", "hbar"],
     or default to a count-based "bar".
3. Column counts:
   - "bubble" ideally uses 3 columns: X numeric, Y numeric, Size numeric.
   - All other charts require 1 or 2 columns as appropriate.
4. If requested chart type is unsupported, choose the closest valid option.
5. If user request is vague or cannot be matched, select a chart type that best represents the data.
6. Respond ONLY with a raw JSON object (no markdown, code fences, or explanations).

Format strictly as:
{{
  "chart_type": "line" | "bar" | "pie" | "scatter" | "histogram" | "box" | "heatmap" | "area" | "donut" | "bubble" | "radar" | "stacked_area" | "hbar",
  "columns": ["column_name_1", "column_name_2", "column_name_3_if_needed"],
  "title": "Chart Title"
}}

User message: "{message}""#,
        columns = headers.join(", ")
    )
}

#[cfg(test)]
#[path = "plot_test.rs"]
mod tests;
