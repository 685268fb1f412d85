//! External tool seam — cleaning, combining, and plotting capabilities.
//!
//! DESIGN
//! ======
//! The actual data work happens in external Python scripts. Each capability
//! is a narrow async trait (paths and bytes in, unit or structured error
//! out), so route and pipeline logic can be tested against in-process fakes
//! without spawning anything.

pub mod python;

use std::path::{Path, PathBuf};

/// Errors from external tool invocations.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} exited with code {code}: {stderr}")]
    NonZeroExit { name: &'static str, code: i32, stderr: String },

    #[error("{name} timed out after {secs}s")]
    TimedOut { name: &'static str, secs: u64 },

    #[error("i/o error talking to {name}: {source}")]
    Io {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Normalizes one raw CSV into the standardized schema.
#[async_trait::async_trait]
pub trait Cleaner: Send + Sync {
    /// Clean `raw` into `cleaned`, tagging rows with `year` when known.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the tool cannot be spawned, exits
    /// non-zero, or exceeds the deadline.
    async fn clean(&self, raw: &Path, cleaned: &Path, year: Option<&str>, log: &Path) -> Result<(), ToolError>;
}

/// Merges multiple cleaned CSVs into one combined dataset file.
#[async_trait::async_trait]
pub trait Combiner: Send + Sync {
    /// Combine `inputs` into `output`.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the tool cannot be spawned, exits
    /// non-zero, or exceeds the deadline.
    async fn combine(&self, inputs: &[PathBuf], output: &Path, log: &Path) -> Result<(), ToolError>;
}

/// Renders a chart PNG from dataset rows.
#[async_trait::async_trait]
pub trait Plotter: Send + Sync {
    /// Write a `chart_type` plot of `columns` to `out`. `rows_json` (a JSON
    /// array of row objects) is delivered on the tool's stdin.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] if the tool cannot be spawned, exits
    /// non-zero, or exceeds the deadline.
    async fn plot(
        &self,
        out: &Path,
        chart_type: &str,
        columns: &[String],
        title: &str,
        rows_json: &str,
    ) -> Result<(), ToolError>;
}
