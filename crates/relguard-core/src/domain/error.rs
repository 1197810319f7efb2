//! Domain-level error taxonomy for relguard.

use std::path::PathBuf;

/// relguard domain errors.
///
/// Every variant here is a fatal precondition failure: it is raised before the
/// version declaration is mutated, or while putting it back. Tool failures are
/// not errors; they travel as exit codes.
#[derive(Debug, thiserror::Error)]
pub enum RelguardError {
    #[error("git error: {0}")]
    GitError(String),

    #[error("short revision hash is not a hexadecimal number: {0:?}")]
    InvalidShortHash(String),

    #[error("no `{key} = \"...\"` line found in {path}")]
    DeclarationKeyMissing { key: String, path: PathBuf },

    #[error("{count} `{key} = \"...\"` lines found in {path}, expected exactly one")]
    AmbiguousDeclaration {
        key: String,
        path: PathBuf,
        count: usize,
    },

    #[error("another build holds the build lock at {0}; run `relguard clean` if none is running")]
    BuildInProgress(PathBuf),

    #[error("failed to restore {path}: {reason}")]
    RestoreFailed { path: PathBuf, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error on {path}: {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelguardError {
    /// Wrap an I/O error with the path it happened on.
    pub fn path_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type for relguard domain operations.
pub type Result<T> = std::result::Result<T, RelguardError>;
