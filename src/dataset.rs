//! Dataset ingestion — naive CSV to row maps.
//!
//! DESIGN
//! ======
//! The external cleaner owns all real CSV semantics; this side only needs the
//! header list and a per-row `column -> value` map to embed in LLM prompts
//! and feed the plotter. Parsing is deliberately naive: split on newlines and
//! commas, trim every cell, no quoting or type inference. A short row simply
//! omits the trailing columns; extra values are dropped.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset file {0} is empty or has no data rows")]
    Empty(String),

    #[error("failed to serialize dataset: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An ingested dataset: header order plus one string map per row.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl Dataset {
    /// Parse CSV text into header + row maps. Blank lines are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut lines = text.trim().lines();
        let header_line = lines.next().unwrap_or("").trim();
        let headers: Vec<String> = if header_line.is_empty() {
            Vec::new()
        } else {
            header_line.split(',').map(|h| h.trim().to_string()).collect()
        };

        let rows = lines
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                headers
                    .iter()
                    .zip(line.split(','))
                    .map(|(header, value)| (header.clone(), value.trim().to_string()))
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    /// Read and parse a dataset file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Read`] if the file is unreadable and
    /// [`DatasetError::Empty`] if it contains no data rows.
    pub async fn load(path: &Path) -> Result<Self, DatasetError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DatasetError::Read { path: path.display().to_string(), source: e })?;

        let dataset = Self::parse(&text);
        if dataset.rows.is_empty() {
            return Err(DatasetError::Empty(path.display().to_string()));
        }
        Ok(dataset)
    }

    /// Rows as a pretty-printed JSON array, for embedding in prompts and
    /// for the plotter's stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, DatasetError> {
        Ok(serde_json::to_string_pretty(&self.rows)?)
    }
}

/// First 4-digit run in a filename, used as a fallback year tag for uploads
/// that arrive without one. No plausibility check.
#[must_use]
pub fn guess_year(filename: &str) -> Option<String> {
    static YEAR_RE: OnceLock<Regex> = OnceLock::new();
    let re = YEAR_RE.get_or_init(|| Regex::new(r"\d{4}").expect("literal regex"));
    re.find(filename).map(|m| m.as_str().to_string())
}

#[cfg(test)]
#[path = "dataset_test.rs"]
mod tests;
