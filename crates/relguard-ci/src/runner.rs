//! Stage execution with exit-status propagation.

use crate::stage::StageConfig;
use anyhow::Context;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::process::Command;
use tracing::{info, warn};

/// Result of a stage execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    /// Stage name.
    pub stage_name: String,

    /// Status the tool actually exited with.
    pub raw_exit_code: i32,

    /// Status after tolerated codes are remapped (0 = success).
    pub exit_code: i32,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl StageResult {
    /// Whether this stage passed.
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether a tolerated nonzero status was turned into success.
    pub fn remapped(&self) -> bool {
        self.raw_exit_code != self.exit_code
    }
}

/// Map a process status to a shell-style exit code.
///
/// A child killed by a signal reports `128 + signal`, the way shells do.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Stage runner.
pub struct CiRunner;

impl CiRunner {
    /// Execute a single stage in `workdir` and return the result.
    ///
    /// The tool inherits stdin/stdout/stderr so its diagnostics reach the
    /// operator unmodified. The child is killed if the returned future is
    /// dropped before it exits.
    pub async fn execute_stage(config: &StageConfig, workdir: &Path) -> anyhow::Result<StageResult> {
        let start = Instant::now();

        let (exe, args) = config
            .command
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("Stage {} has empty command", config.name))?;

        info!(stage = %config.name, command = ?config.command, "running stage");

        let mut child = Command::new(exe)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start stage {} ({exe})", config.name))?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for stage {}", config.name))?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let raw_exit_code = exit_code_of(status);
        let exit_code = if config.tolerated_exit_codes.contains(&raw_exit_code) {
            info!(
                stage = %config.name,
                raw_exit_code,
                "tolerated exit status, treating as success"
            );
            0
        } else {
            raw_exit_code
        };

        if exit_code != 0 {
            warn!(stage = %config.name, exit_code, duration_ms, "stage failed");
        } else {
            info!(stage = %config.name, duration_ms, "stage passed");
        }

        Ok(StageResult {
            stage_name: config.name.clone(),
            raw_exit_code,
            exit_code,
            duration_ms,
        })
    }

    /// Execute stages in order, stopping at the first failure.
    pub async fn execute_all(
        configs: &[StageConfig],
        workdir: &Path,
    ) -> anyhow::Result<Vec<StageResult>> {
        let mut results = Vec::with_capacity(configs.len());
        for config in configs {
            let result = Self::execute_stage(config, workdir).await?;
            let passed = result.passed();
            results.push(result);
            if !passed {
                break;
            }
        }
        Ok(results)
    }
}
