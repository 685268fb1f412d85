//! Upload pipeline — clean each file, combine, summarize.
//!
//! DESIGN
//! ======
//! State machine per batch: uploaded -> cleaning -> cleaned -> combining ->
//! combined. Files are cleaned one at a time in upload order; the first
//! failure aborts the batch and names the file that failed. Combine starts
//! only after every clean succeeded. The caller is expected to hold the
//! dataset write gate for the whole run so readers never see a
//! half-replaced combined file.
//!
//! Year tags are index-aligned with the uploaded files; a missing tag falls
//! back to a 4-digit guess from the original filename, and files past the
//! end of the `years` array proceed untagged rather than failing the batch.

use std::path::PathBuf;

use tracing::warn;

use crate::dataset::{Dataset, guess_year};
use crate::services::query;
use crate::state::AppState;
use crate::tools::ToolError;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cleaning failed for {file}: {source}")]
    CleanFailed {
        file: String,
        #[source]
        source: ToolError,
    },

    #[error("combining failed: {0}")]
    CombineFailed(#[source] ToolError),
}

/// One uploaded file queued for cleaning.
#[derive(Debug, Clone)]
pub struct FileToClean {
    pub raw_path: PathBuf,
    pub cleaned_path: PathBuf,
    pub year: Option<String>,
}

/// A raw upload saved to disk, still carrying its client-side name.
#[derive(Debug, Clone)]
pub struct SavedUpload {
    pub original_name: String,
    pub raw_path: PathBuf,
    pub cleaned_path: PathBuf,
}

// =============================================================================
// YEAR PAIRING
// =============================================================================

/// Pair uploads with year tags by index. Blank tags and files beyond the end
/// of `years` fall back to [`guess_year`] on the original filename.
#[must_use]
pub fn pair_years(uploads: Vec<SavedUpload>, years: &[String]) -> Vec<FileToClean> {
    if years.len() < uploads.len() {
        warn!(files = uploads.len(), years = years.len(), "fewer year tags than files; guessing from filenames");
    }
    uploads
        .into_iter()
        .enumerate()
        .map(|(i, upload)| {
            let year = years
                .get(i)
                .map(|y| y.trim().to_string())
                .filter(|y| !y.is_empty())
                .or_else(|| guess_year(&upload.original_name));
            FileToClean { raw_path: upload.raw_path, cleaned_path: upload.cleaned_path, year }
        })
        .collect()
}

// =============================================================================
// PIPELINE RUN
// =============================================================================

/// Clean every file, combine the results, and attempt an initial insights
/// summary. Returns the summary when an LLM is configured and the summary
/// call succeeds; summary failure is non-fatal.
///
/// # Errors
///
/// Returns a [`PipelineError`] naming the failed stage (and file, for
/// cleans).
pub async fn run(state: &AppState, files: &[FileToClean]) -> Result<Option<String>, PipelineError> {
    let log = state.workspace.log_path();

    for file in files {
        let name = file
            .raw_path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        state
            .run_log
            .append(&format!("Cleaning {name} (Year: {})", file.year.as_deref().unwrap_or("unknown")))
            .await;

        state
            .cleaner
            .clean(&file.raw_path, &file.cleaned_path, file.year.as_deref(), log)
            .await
            .map_err(|e| PipelineError::CleanFailed { file: name, source: e })?;
    }

    state.run_log.append("Combining cleaned files...").await;
    let cleaned_paths: Vec<PathBuf> = files.iter().map(|f| f.cleaned_path.clone()).collect();
    state
        .combiner
        .combine(&cleaned_paths, state.workspace.combined_path(), log)
        .await
        .map_err(PipelineError::CombineFailed)?;

    Ok(initial_insights(state).await)
}

/// Best-effort executive summary of the freshly combined dataset.
async fn initial_insights(state: &AppState) -> Option<String> {
    let llm = state.llm.as_ref()?;
    state.run_log.append("Generating initial insights...").await;

    let dataset = match Dataset::load(state.workspace.combined_path()).await {
        Ok(dataset) => dataset,
        Err(e) => {
            warn!(error = %e, "combined dataset unreadable; skipping initial insights");
            return None;
        }
    };
    match query::summarize(llm, &dataset).await {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!(error = %e, "initial insights failed; upload still succeeds");
            None
        }
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
