//! Version resolution against a live repository.

use std::path::Path;

use tracing::info;

use crate::declaration::VersionDeclaration;
use crate::domain::error::Result;
use crate::domain::version::{resolve_version, ResolvedBranch, ResolvedVersion};
use crate::git;

/// Resolve the version to embed for a build of `repo_dir`.
///
/// The short hash is always resolved first so that a directory that is not a
/// repository, or has no commits, fails before anything else happens.
pub fn resolve(repo_dir: &Path, declaration: &VersionDeclaration) -> Result<ResolvedVersion> {
    let short_sha = git::capture_short_sha(repo_dir)?;
    let tag = git::exact_tag(repo_dir);

    let resolved = resolve_version(declaration.version(), tag.as_deref(), &short_sha)?;
    match &resolved.branch {
        ResolvedBranch::UseTag(tag) => {
            info!(tag = %tag, version = %resolved, "HEAD has release tag, using it");
        }
        ResolvedBranch::UseDerived => {
            info!(
                base = declaration.version(),
                short_sha = %short_sha,
                candidate_tag = tag.as_deref().unwrap_or("<none>"),
                version = %resolved,
                "no release tag on HEAD, deriving version"
            );
        }
    }
    Ok(resolved)
}
