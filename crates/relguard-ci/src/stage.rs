//! Stage definitions: one external tool invocation each.

use relguard_core::ToolsConfig;
use serde::{Deserialize, Serialize};

/// Builtin stages backed by the project's tool configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinStage {
    /// Formatter (`ruff format .`).
    Format,

    /// Style check (`ruff check .`).
    StyleCheck,

    /// Type check (`mypy src`).
    TypeCheck,

    /// Test runner (`pytest`).
    Test,

    /// Clear the packaging tool's own state (`hatch clean`).
    CleanBuildState,

    /// Build wheel and sdist (`hatch build`).
    Package,
}

impl BuiltinStage {
    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinStage::Format => "format",
            BuiltinStage::StyleCheck => "style_check",
            BuiltinStage::TypeCheck => "type_check",
            BuiltinStage::Test => "test",
            BuiltinStage::CleanBuildState => "clean_build_state",
            BuiltinStage::Package => "package",
        }
    }

    /// Get the stage's command from the tool configuration.
    pub fn command(&self, tools: &ToolsConfig) -> Vec<String> {
        match self {
            BuiltinStage::Format => tools.format.clone(),
            BuiltinStage::StyleCheck => tools.style_check.clone(),
            BuiltinStage::TypeCheck => tools.type_check.clone(),
            BuiltinStage::Test => tools.test.clone(),
            BuiltinStage::CleanBuildState => tools.clean_build_state.clone(),
            BuiltinStage::Package => tools.package.clone(),
        }
    }

    /// Exit statuses that count as success for this stage.
    ///
    /// Only the test runner has one: "no tests collected".
    pub fn tolerated_exit_codes(&self, tools: &ToolsConfig) -> Vec<i32> {
        match self {
            BuiltinStage::Test => tools.no_tests_exit_code.into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// Configuration for a stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageConfig {
    /// Human-readable stage name.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Nonzero statuses remapped to 0.
    pub tolerated_exit_codes: Vec<i32>,
}

impl StageConfig {
    /// Create a stage configuration from a builtin stage.
    pub fn from_builtin(stage: BuiltinStage, tools: &ToolsConfig) -> Self {
        Self {
            name: stage.name().to_string(),
            command: stage.command(tools),
            tolerated_exit_codes: stage.tolerated_exit_codes(tools),
        }
    }

    /// Create a custom stage configuration.
    pub fn custom(name: String, command: Vec<String>) -> Self {
        Self {
            name,
            command,
            tolerated_exit_codes: Vec::new(),
        }
    }

    /// Treat `code` as success.
    pub fn tolerate(mut self, code: i32) -> Self {
        self.tolerated_exit_codes.push(code);
        self
    }
}
