//! Python tool runner — spawns the data-agent scripts with a deadline.
//!
//! DESIGN
//! ======
//! One struct implements all three capability traits by invoking
//! `data_processor.py` (clean/combine subcommands) and `plot_generator.py`.
//! Children are spawned with piped stdio and `kill_on_drop`, and every run
//! is wrapped in a timeout; an expired deadline kills the child rather than
//! wedging the request. Captured stdout/stderr lines are appended to the
//! shared run log, matching what the scripts themselves write there.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::info;

use super::{Cleaner, Combiner, Plotter, ToolError};
use crate::workspace::RunLog;

pub const DATA_PROCESSOR_SCRIPT: &str = "data_processor.py";
pub const PLOT_GENERATOR_SCRIPT: &str = "plot_generator.py";

pub struct PyTools {
    python_bin: String,
    scripts_dir: PathBuf,
    timeout: Duration,
    run_log: RunLog,
}

impl PyTools {
    #[must_use]
    pub fn new(python_bin: String, scripts_dir: PathBuf, timeout: Duration, run_log: RunLog) -> Self {
        Self { python_bin, scripts_dir, timeout, run_log }
    }

    fn script(&self, name: &str) -> PathBuf {
        self.scripts_dir.join(name)
    }

    /// Run one child to completion under the deadline, feeding `stdin_payload`
    /// if given. Non-zero exit and timeout become typed errors.
    async fn run(&self, name: &'static str, mut command: Command, stdin_payload: Option<&str>) -> Result<(), ToolError> {
        command
            .stdin(if stdin_payload.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| ToolError::Spawn { program: self.python_bin.clone(), source: e })?;

        // The deadline covers the stdin handoff too: a child that never
        // reads stdin would otherwise block the write past any timeout.
        let feed_and_wait = async {
            if let Some(payload) = stdin_payload {
                if let Some(mut stdin) = child.stdin.take() {
                    stdin
                        .write_all(payload.as_bytes())
                        .await
                        .map_err(|e| ToolError::Io { name, source: e })?;
                    // Closing stdin lets the script start reading to EOF.
                    drop(stdin);
                }
            }
            child
                .wait_with_output()
                .await
                .map_err(|e| ToolError::Io { name, source: e })
        };

        let secs = self.timeout.as_secs();
        let output = tokio::time::timeout(self.timeout, feed_and_wait)
            .await
            .map_err(|_| ToolError::TimedOut { name, secs })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            self.run_log.append(&format!("STDOUT: {}", stdout.trim())).await;
        }
        if !stderr.trim().is_empty() {
            self.run_log.append(&format!("STDERR: {}", stderr.trim())).await;
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            return Err(ToolError::NonZeroExit { name, code, stderr: stderr.trim().to_string() });
        }

        info!(tool = name, "external tool finished");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Cleaner for PyTools {
    async fn clean(&self, raw: &Path, cleaned: &Path, year: Option<&str>, log: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.python_bin);
        command
            .arg(self.script(DATA_PROCESSOR_SCRIPT))
            .arg("clean")
            .arg("--input_path")
            .arg(raw)
            .arg("--output_path")
            .arg(cleaned);
        if let Some(year) = year {
            command.arg("--year").arg(year);
        }
        command.arg("--log_file").arg(log);
        self.run("clean", command, None).await
    }
}

#[async_trait::async_trait]
impl Combiner for PyTools {
    async fn combine(&self, inputs: &[PathBuf], output: &Path, log: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.python_bin);
        command
            .arg(self.script(DATA_PROCESSOR_SCRIPT))
            .arg("combine")
            .arg("--output_path")
            .arg(output)
            .arg("--log_file")
            .arg(log)
            .arg("--input_paths");
        for input in inputs {
            command.arg(input);
        }
        self.run("combine", command, None).await
    }
}

#[async_trait::async_trait]
impl Plotter for PyTools {
    async fn plot(
        &self,
        out: &Path,
        chart_type: &str,
        columns: &[String],
        title: &str,
        rows_json: &str,
    ) -> Result<(), ToolError> {
        let mut command = Command::new(&self.python_bin);
        command
            .arg(self.script(PLOT_GENERATOR_SCRIPT))
            .arg(out)
            .arg(chart_type)
            .arg(columns.join(","))
            .arg(title);
        self.run("plot", command, Some(rows_json)).await
    }
}

#[cfg(test)]
#[path = "python_test.rs"]
mod tests;
