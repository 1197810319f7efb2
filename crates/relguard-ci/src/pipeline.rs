//! Step orchestration: format, lint, test, build, and `all`.

use crate::build::{BuildOutcome, BuildStep};
use crate::runner::{CiRunner, StageResult};
use crate::stage::{BuiltinStage, StageConfig};
use relguard_core::{ProjectConfig, ResolvedVersion};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// A pipeline step, one per CLI command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Format,
    Lint,
    Test,
    Build,
}

impl Step {
    /// The order `all` runs in.
    pub const ALL: [Step; 4] = [Step::Format, Step::Lint, Step::Test, Step::Build];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Format => "format",
            Step::Lint => "lint",
            Step::Test => "test",
            Step::Build => "build",
        }
    }

    /// Stages for the plain run-and-propagate steps. Build has its own driver.
    pub fn stages(&self) -> &'static [BuiltinStage] {
        match self {
            Step::Format => &[BuiltinStage::Format],
            Step::Lint => &[BuiltinStage::StyleCheck, BuiltinStage::TypeCheck],
            Step::Test => &[BuiltinStage::Test],
            Step::Build => &[BuiltinStage::CleanBuildState, BuiltinStage::Package],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: Step,

    /// Stage results, in execution order.
    pub stages: Vec<StageResult>,

    /// Step exit status (0 = success).
    pub exit_code: i32,

    /// Set for the build step.
    pub version: Option<ResolvedVersion>,

    pub interrupted: bool,
}

impl StepOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    fn from_stages(step: Step, stages: Vec<StageResult>) -> Self {
        let exit_code = stages
            .iter()
            .find(|r| !r.passed())
            .map(|r| r.exit_code)
            .unwrap_or(0);
        Self {
            step,
            stages,
            exit_code,
            version: None,
            interrupted: false,
        }
    }

    fn from_build(outcome: BuildOutcome) -> Self {
        Self {
            step: Step::Build,
            stages: outcome.stages,
            exit_code: outcome.exit_code,
            version: Some(outcome.version),
            interrupted: outcome.interrupted,
        }
    }
}

/// Result of a sequence of steps.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Steps that ran; the last one is the failure, if any.
    pub steps: Vec<StepOutcome>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    /// First failing step's exit status, or 0.
    pub exit_code: i32,
}

impl PipelineResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Number of steps that passed.
    pub fn passed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.success()).count()
    }

    /// Number of steps that failed.
    pub fn failed_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.success()).count()
    }
}

/// Step orchestrator for one workspace.
pub struct CiPipeline<'a> {
    workspace: &'a Path,
    config: &'a ProjectConfig,
}

impl<'a> CiPipeline<'a> {
    pub fn new(workspace: &'a Path, config: &'a ProjectConfig) -> Self {
        Self { workspace, config }
    }

    /// Run one step.
    pub async fn run_step(&self, step: Step) -> anyhow::Result<StepOutcome> {
        info!(step = %step, "starting step");
        let outcome = match step {
            Step::Build => {
                StepOutcome::from_build(BuildStep::new(self.workspace, self.config).run().await?)
            }
            _ => {
                let configs: Vec<StageConfig> = step
                    .stages()
                    .iter()
                    .map(|stage| StageConfig::from_builtin(*stage, &self.config.tools))
                    .collect();
                let results = CiRunner::execute_all(&configs, self.workspace).await?;
                StepOutcome::from_stages(step, results)
            }
        };
        info!(step = %step, exit_code = outcome.exit_code, "step finished");
        Ok(outcome)
    }

    /// Run steps in order, stopping at the first failure.
    pub async fn run_steps(&self, steps: &[Step]) -> anyhow::Result<PipelineResult> {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(steps.len());
        let mut exit_code = 0;

        for step in steps {
            let outcome = self.run_step(*step).await?;
            exit_code = outcome.exit_code;
            outcomes.push(outcome);
            if exit_code != 0 {
                break;
            }
        }

        Ok(PipelineResult {
            steps: outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
            exit_code,
        })
    }

    /// format -> lint -> test -> build.
    pub async fn run_all(&self) -> anyhow::Result<PipelineResult> {
        self.run_steps(&Step::ALL).await
    }
}
