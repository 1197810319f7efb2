//! Scoped mutation of the version declaration.
//!
//! [`DeclarationGuard::acquire`] stamps the resolved version into the
//! declaration file and hands back a guard. Whatever happens next (the build
//! succeeds, the tool fails, the caller bails out with `?`, the task is
//! cancelled by a termination signal) dropping the guard puts the file back
//! to its committed content.
//!
//! Only one build may hold the declaration at a time. A lock file inside the
//! git directory, created with `create_new`, enforces that; a second acquirer
//! gets [`RelguardError::BuildInProgress`]. Keeping it out of the work tree
//! keeps it out of the package sources.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::declaration::VersionDeclaration;
use crate::domain::error::{RelguardError, Result};
use crate::git;

/// Name of the build lock inside the git directory.
pub const LOCK_FILE_NAME: &str = "relguard.lock";

/// Build lock path for a repository: `<git dir>/relguard.lock`.
pub fn lock_path(repo_dir: &Path) -> Result<PathBuf> {
    git::git_path(repo_dir, LOCK_FILE_NAME)
}

/// Remove a lock left behind by a build that never got to release it.
///
/// Returns whether a lock was found.
pub fn remove_stale_lock(repo_dir: &Path) -> Result<bool> {
    let path = lock_path(repo_dir)?;
    match std::fs::remove_file(&path) {
        Ok(()) => {
            warn!(lock = %path.display(), "removed stale build lock");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RelguardError::path_io(&path, e)),
    }
}

/// Live mutation of a version declaration. Restores on drop.
#[derive(Debug)]
pub struct DeclarationGuard {
    repo_dir: PathBuf,
    path: PathBuf,
    lock_path: PathBuf,
    snapshot: String,
    released: bool,
}

impl DeclarationGuard {
    /// Take the lock and write `version` into the declaration.
    pub fn acquire(
        repo_dir: &Path,
        declaration: &VersionDeclaration,
        version: &str,
    ) -> Result<Self> {
        let path = declaration.path().to_path_buf();
        let lock_path = lock_path(repo_dir)?;

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(RelguardError::BuildInProgress(lock_path));
            }
            Err(e) => return Err(RelguardError::path_io(&lock_path, e)),
        }

        // From here on the guard owns the lock; an early return drops it and
        // cleans up.
        let guard = Self {
            repo_dir: repo_dir.to_path_buf(),
            path,
            lock_path,
            snapshot: declaration.content().to_string(),
            released: false,
        };

        std::fs::write(&guard.path, declaration.with_version(version))
            .map_err(|e| RelguardError::path_io(&guard.path, e))?;
        info!(
            path = %guard.path.display(),
            version,
            "stamped version declaration"
        );
        Ok(guard)
    }

    /// The declaration path this guard owns.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore now and report the outcome.
    pub fn restore(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let result = restore_declaration(&self.repo_dir, &self.path, Some(&self.snapshot));

        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            warn!(lock = %self.lock_path.display(), error = %e, "failed to remove build lock");
        }
        result
    }
}

impl Drop for DeclarationGuard {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(path = %self.path.display(), error = %e, "version declaration was not restored");
        }
    }
}

/// Put a declaration back to its committed content.
///
/// Uses `git checkout HEAD -- <path>`. When git cannot do it (file untracked,
/// git missing) and a `fallback` snapshot is supplied, the snapshot is written
/// back instead.
pub fn restore_declaration(repo_dir: &Path, path: &Path, fallback: Option<&str>) -> Result<()> {
    let rel = path.strip_prefix(repo_dir).unwrap_or(path);
    match git::restore_from_head(repo_dir, rel) {
        Ok(()) => {
            info!(path = %path.display(), "restored version declaration from HEAD");
            Ok(())
        }
        Err(git_err) => match fallback {
            Some(snapshot) => {
                debug!(error = %git_err, "git restore failed, writing snapshot");
                std::fs::write(path, snapshot).map_err(|e| RelguardError::RestoreFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
                info!(path = %path.display(), "restored version declaration from snapshot");
                Ok(())
            }
            None => Err(RelguardError::RestoreFailed {
                path: path.to_path_buf(),
                reason: git_err.to_string(),
            }),
        },
    }
}
