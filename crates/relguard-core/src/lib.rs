//! relguard core library
//!
//! Version resolution from git state, the scoped version-declaration guard,
//! workspace cleaning and shared configuration/tracing setup.

pub mod clean;
pub mod config;
pub mod declaration;
pub mod domain;
pub mod git;
pub mod guard;
pub mod resolver;
pub mod telemetry;

pub use clean::{clean, clean_workspace, CleanReport};
pub use config::{DeclarationConfig, ProjectConfig, ToolsConfig, CONFIG_FILE_NAME};
pub use declaration::VersionDeclaration;
pub use domain::{
    classify_version, is_release_tag, resolve_version, RelguardError, ResolvedBranch,
    ResolvedVersion, Result,
};
pub use git::{capture_short_sha, exact_tag, is_git_repo, restore_from_head};
pub use guard::{restore_declaration, DeclarationGuard};
pub use resolver::resolve;
pub use telemetry::init_tracing;

/// relguard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
