//! relguard CI - step execution for the package pipeline
//!
//! Provides:
//! - Stage definitions for the external tools (formatter, linters, tests, packaging)
//! - A runner that propagates each tool's exit status
//! - The guarded build step and the `all` pipeline

pub mod build;
pub mod pipeline;
pub mod runner;
pub mod stage;

// Re-export key types
pub use build::{
    BuildOutcome, BuildStep, TerminationSignals, HANGUP_EXIT_CODE, INTERRUPTED_EXIT_CODE,
    TERMINATED_EXIT_CODE,
};
pub use pipeline::{CiPipeline, PipelineResult, Step, StepOutcome};
pub use runner::{CiRunner, StageResult};
pub use stage::{BuiltinStage, StageConfig};
