//! The build step: resolve, stamp, package, restore.

use crate::pipeline::Step;
use crate::runner::{CiRunner, StageResult};
use crate::stage::StageConfig;
use anyhow::Context;
use relguard_core::{resolve, DeclarationGuard, ProjectConfig, ResolvedVersion, VersionDeclaration};
use std::future::Future;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{info, warn};

/// Exit status reported when the build is interrupted (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Exit status reported when the build is terminated (128 + SIGTERM).
pub const TERMINATED_EXIT_CODE: i32 = 143;

/// Exit status reported when the controlling terminal hangs up (128 + SIGHUP).
pub const HANGUP_EXIT_CODE: i32 = 129;

/// Outcome of one build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Version embedded during packaging.
    pub version: ResolvedVersion,

    /// Stages that ran: clean, then package unless clean failed.
    pub stages: Vec<StageResult>,

    /// Step exit status: the first failing stage's, 128 + signal on
    /// interrupt, else 0.
    pub exit_code: i32,

    /// Whether a termination signal (or the supplied interrupt) cut the
    /// build short.
    pub interrupted: bool,

    /// Artifact directory.
    pub dist_dir: PathBuf,
}

impl BuildOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Resolves the version and drives the packaging tool around a
/// [`DeclarationGuard`].
pub struct BuildStep<'a> {
    workspace: &'a Path,
    config: &'a ProjectConfig,
}

/// Listeners for the signals that end a build early: SIGINT, SIGTERM and
/// SIGHUP.
///
/// Handlers are installed by [`TerminationSignals::listen`], so a signal
/// delivered any time after that is caught, even before [`recv`] is polled.
///
/// [`recv`]: TerminationSignals::recv
#[cfg(unix)]
pub struct TerminationSignals {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    pub fn listen() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the next signal and return the exit status it maps to.
    pub async fn recv(&mut self) -> i32 {
        tokio::select! {
            Some(()) = self.interrupt.recv() => INTERRUPTED_EXIT_CODE,
            Some(()) = self.terminate.recv() => TERMINATED_EXIT_CODE,
            Some(()) = self.hangup.recv() => HANGUP_EXIT_CODE,
            else => std::future::pending::<i32>().await,
        }
    }
}

#[cfg(not(unix))]
pub struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    pub fn listen() -> std::io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) -> i32 {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        INTERRUPTED_EXIT_CODE
    }
}

impl<'a> BuildStep<'a> {
    pub fn new(workspace: &'a Path, config: &'a ProjectConfig) -> Self {
        Self { workspace, config }
    }

    /// Stages run while the declaration is stamped.
    pub fn stages(&self) -> Vec<StageConfig> {
        Step::Build
            .stages()
            .iter()
            .map(|stage| StageConfig::from_builtin(*stage, &self.config.tools))
            .collect()
    }

    /// Resolve the version without touching anything.
    pub fn resolve(&self) -> anyhow::Result<(VersionDeclaration, ResolvedVersion)> {
        let path = self.config.declaration_path(self.workspace);
        let declaration = VersionDeclaration::load(&path, &self.config.declaration.key)
            .context("Failed to read version declaration")?;
        let version =
            resolve(self.workspace, &declaration).context("Failed to resolve build version")?;
        Ok((declaration, version))
    }

    /// Build, restoring the declaration on SIGINT, SIGTERM or SIGHUP.
    pub async fn run(&self) -> anyhow::Result<BuildOutcome> {
        let mut signals =
            TerminationSignals::listen().context("Failed to listen for termination signals")?;
        self.run_until(signals.recv()).await
    }

    /// Build, treating completion of `interrupt` as an external interrupt.
    /// `interrupt` yields the exit status to report.
    ///
    /// On every exit path the declaration is back at its committed content
    /// before this returns: the guard is released explicitly on the normal
    /// and interrupt paths and by `Drop` when an error propagates.
    pub async fn run_until<F>(&self, interrupt: F) -> anyhow::Result<BuildOutcome>
    where
        F: Future<Output = i32>,
    {
        let (declaration, version) = self.resolve()?;

        let guard = DeclarationGuard::acquire(self.workspace, &declaration, &version.value)
            .context("Failed to stamp version declaration")?;

        let stages = self.stages();
        let run = CiRunner::execute_all(&stages, self.workspace);

        let (results, interrupted) = tokio::select! {
            results = run => (results?, None),
            exit_code = interrupt => {
                warn!(exit_code, "build interrupted, restoring version declaration");
                (Vec::new(), Some(exit_code))
            }
        };

        guard
            .restore()
            .context("Failed to restore version declaration")?;

        let exit_code = interrupted.unwrap_or_else(|| {
            results
                .iter()
                .find(|r| !r.passed())
                .map(|r| r.exit_code)
                .unwrap_or(0)
        });

        let dist_dir = self.workspace.join(&self.config.tools.dist_dir);
        if exit_code == 0 {
            info!(version = %version, dist = %dist_dir.display(), "build finished");
        } else {
            warn!(version = %version, exit_code, "build failed");
        }

        Ok(BuildOutcome {
            version,
            stages: results,
            exit_code,
            interrupted: interrupted.is_some(),
            dist_dir,
        })
    }
}
