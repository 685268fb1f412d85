//! Server configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Everything has a default so a bare `cargo run` works against a local
//! `./data` workspace and the stock Python scripts in `./data-agent`. The
//! LLM credential is handled separately in `llm::config` because its absence
//! disables AI features instead of changing paths.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 2601;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_IMAGES_DIR: &str = "./public/images";
pub const DEFAULT_PYTHON_BIN: &str = "python";
pub const DEFAULT_SCRIPTS_DIR: &str = "./data-agent";
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 300;

/// Typed server configuration. Loaded once in `main`.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port.
    pub port: u16,
    /// Workspace root: raw uploads, `cleaned/`, the combined CSV, run log.
    pub data_dir: PathBuf,
    /// Plot PNG output directory, served at `/images`.
    pub images_dir: PathBuf,
    /// Python interpreter used for the external tool scripts.
    pub python_bin: String,
    /// Directory holding `data_processor.py` and `plot_generator.py`.
    pub scripts_dir: PathBuf,
    /// Hard deadline for any single external tool invocation.
    pub tool_timeout: Duration,
}

impl Config {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// - `PORT`: listen port (default 2601)
    /// - `DATA_DIR`: workspace root (default `./data`)
    /// - `IMAGES_DIR`: plot output dir (default `./public/images`)
    /// - `PYTHON_BIN`: interpreter (default `python`)
    /// - `SCRIPTS_DIR`: tool scripts dir (default `./data-agent`)
    /// - `TOOL_TIMEOUT_SECS`: subprocess deadline (default 300)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            data_dir: env_path("DATA_DIR", DEFAULT_DATA_DIR),
            images_dir: env_path("IMAGES_DIR", DEFAULT_IMAGES_DIR),
            python_bin: std::env::var("PYTHON_BIN").unwrap_or_else(|_| DEFAULT_PYTHON_BIN.to_string()),
            scripts_dir: env_path("SCRIPTS_DIR", DEFAULT_SCRIPTS_DIR),
            tool_timeout: Duration::from_secs(env_parse("TOOL_TIMEOUT_SECS", DEFAULT_TOOL_TIMEOUT_SECS)),
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key).map_or_else(|_| PathBuf::from(default), PathBuf::from)
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
