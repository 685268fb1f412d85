//! On-disk workspace — upload, cleaned, and plot file locations.
//!
//! DESIGN
//! ======
//! All dataset paths hang off a single `Workspace` handle held in `AppState`,
//! so tests can point the whole pipeline at a temp directory instead of a
//! process-wide fixed location. The run log is an append-only text file that
//! the external Python tools also write to; it is truncated once at startup.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

pub const CLEANED_SUBDIR: &str = "cleaned";
pub const COMBINED_FILE: &str = "combined_data.csv";
pub const RUN_LOG_FILE: &str = "run_log.txt";

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("workspace i/o error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: &Path, source: std::io::Error) -> WorkspaceError {
    WorkspaceError::Io { path: path.display().to_string(), source }
}

// =============================================================================
// WORKSPACE
// =============================================================================

/// Directory layout for one server instance.
#[derive(Debug, Clone)]
pub struct Workspace {
    data_dir: PathBuf,
    cleaned_dir: PathBuf,
    images_dir: PathBuf,
    combined_path: PathBuf,
    log_path: PathBuf,
}

impl Workspace {
    /// Create the workspace directories and truncate any previous run log.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or the stale run
    /// log cannot be removed.
    pub fn init(data_dir: &Path, images_dir: &Path) -> Result<Self, WorkspaceError> {
        let cleaned_dir = data_dir.join(CLEANED_SUBDIR);
        std::fs::create_dir_all(data_dir).map_err(|e| io_err(data_dir, e))?;
        std::fs::create_dir_all(&cleaned_dir).map_err(|e| io_err(&cleaned_dir, e))?;
        std::fs::create_dir_all(images_dir).map_err(|e| io_err(images_dir, e))?;

        let log_path = data_dir.join(RUN_LOG_FILE);
        if log_path.exists() {
            std::fs::remove_file(&log_path).map_err(|e| io_err(&log_path, e))?;
        }

        Ok(Self {
            combined_path: data_dir.join(COMBINED_FILE),
            data_dir: data_dir.to_path_buf(),
            cleaned_dir,
            images_dir: images_dir.to_path_buf(),
            log_path,
        })
    }

    /// Unique destination for a raw upload: `raw_{millis}-{rand}_{name}`.
    /// The original filename is reduced to its basename first.
    #[must_use]
    pub fn raw_upload_path(&self, original_name: &str) -> PathBuf {
        let name = sanitize_name(original_name);
        let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
        self.data_dir.join(format!("raw_{}-{suffix}_{name}", now_ms()))
    }

    /// Cleaned-file destination for a raw upload: `cleaned/cleaned_{raw_basename}`.
    #[must_use]
    pub fn cleaned_path_for(&self, raw_path: &Path) -> PathBuf {
        let base = raw_path
            .file_name()
            .map_or_else(|| "upload.csv".to_string(), |n| n.to_string_lossy().into_owned());
        self.cleaned_dir.join(format!("cleaned_{base}"))
    }

    #[must_use]
    pub fn combined_path(&self) -> &Path {
        &self.combined_path
    }

    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    #[must_use]
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    #[must_use]
    pub fn plot_path(&self, filename: &str) -> PathBuf {
        self.images_dir.join(filename)
    }

    /// Most-recently-modified file in the cleaned directory, or `None` when
    /// there are no cleaned datasets yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleaned directory cannot be read.
    pub fn latest_cleaned_file(&self) -> Result<Option<PathBuf>, WorkspaceError> {
        let entries = std::fs::read_dir(&self.cleaned_dir).map_err(|e| io_err(&self.cleaned_dir, e))?;

        let mut latest: Option<(SystemTime, PathBuf)> = None;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.cleaned_dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(UNIX_EPOCH);
            if latest.as_ref().is_none_or(|(t, _)| modified > *t) {
                latest = Some((modified, path));
            }
        }
        Ok(latest.map(|(_, path)| path))
    }
}

/// Strip any path components from a client-supplied filename.
fn sanitize_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();
    if base.is_empty() { "upload.csv".to_string() } else { base.to_string() }
}

/// Current time as milliseconds since Unix epoch.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// RUN LOG
// =============================================================================

/// Append-only run log shared with the external Python tools.
///
/// Appends are best-effort: a log write failure is reported via `tracing`
/// and never fails the request. Lines from concurrent requests may
/// interleave; each line is self-contained.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append `[timestamp] message` and mirror it to the tracing log.
    pub async fn append(&self, message: &str) {
        info!(target: "run_log", "{message}");
        let ts = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "unknown-time".to_string());
        let line = format!("[{ts}] {message}\n");

        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            // tokio files write on a background task; flush so the line is
            // on disk before `append` returns.
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            warn!(error = %e, path = %self.path.display(), "run log append failed");
        }
    }
}

#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;
