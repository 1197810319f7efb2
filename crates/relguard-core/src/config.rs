//! Project configuration: where the version lives and which tools to run.
//!
//! Defaults describe the neatresume package layout. A `relguard.toml` at the
//! workspace root may override any field:
//!
//! ```toml
//! [declaration]
//! path = "src/neatresume/__about__.py"
//! key = "__version__"
//!
//! [tools]
//! test = ["pytest", "-q"]
//! no_tests_exit_code = 5
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::domain::error::{RelguardError, Result};

/// Name of the optional config file at the workspace root.
pub const CONFIG_FILE_NAME: &str = "relguard.toml";

/// pytest's `ExitCode.NO_TESTS_COLLECTED`.
pub const PYTEST_NO_TESTS_COLLECTED: i32 = 5;

/// Location and key of the version declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeclarationConfig {
    /// Path relative to the workspace root.
    pub path: PathBuf,
    pub key: String,
}

impl Default for DeclarationConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("src/neatresume/__about__.py"),
            key: "__version__".to_string(),
        }
    }
}

/// Commands for the external collaborators. First element is the executable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub format: Vec<String>,
    pub style_check: Vec<String>,
    pub type_check: Vec<String>,
    pub test: Vec<String>,
    /// Test runner status meaning "no tests collected"; treated as success.
    pub no_tests_exit_code: Option<i32>,
    /// Clears the packaging tool's own state before a build.
    pub clean_build_state: Vec<String>,
    pub package: Vec<String>,
    /// Where the packaging tool writes artifacts, relative to the workspace.
    pub dist_dir: PathBuf,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            format: argv(&["ruff", "format", "."]),
            style_check: argv(&["ruff", "check", "."]),
            type_check: argv(&["mypy", "src"]),
            test: argv(&["pytest"]),
            no_tests_exit_code: Some(PYTEST_NO_TESTS_COLLECTED),
            clean_build_state: argv(&["hatch", "clean"]),
            package: argv(&["hatch", "build", "-t", "wheel", "-t", "sdist", "dist"]),
            dist_dir: PathBuf::from("dist"),
        }
    }
}

/// Full project configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub declaration: DeclarationConfig,
    pub tools: ToolsConfig,
}

impl ProjectConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RelguardError::Config(e.to_string()))
    }

    /// Load configuration for a workspace.
    ///
    /// An explicit `path` must exist. Without one, `relguard.toml` in
    /// `workspace` is used when present and defaults otherwise.
    pub fn load(workspace: &Path, path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = workspace.join(CONFIG_FILE_NAME);
                if !default.exists() {
                    debug!("no {CONFIG_FILE_NAME}, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&candidate)
            .map_err(|e| RelguardError::path_io(&candidate, e))?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| RelguardError::Config(format!("{}: {e}", candidate.display())))?;
        debug!(path = %candidate.display(), "loaded config");
        Ok(config)
    }

    /// Absolute (workspace-joined) declaration path.
    pub fn declaration_path(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.declaration.path)
    }
}
