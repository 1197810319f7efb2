//! Git queries for version resolution and declaration restoration.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::domain::error::{RelguardError, Result};

fn git(repo_dir: &Path, args: &[&str]) -> Result<Output> {
    debug!(?args, dir = %repo_dir.display(), "running git");
    Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .map_err(|e| RelguardError::GitError(format!("failed to run git: {e}")))
}

/// Capture the abbreviated HEAD commit hash.
///
/// Runs `git rev-parse --short HEAD`. Fails outside a repository and in a
/// repository with no commits.
pub fn capture_short_sha(repo_dir: &Path) -> Result<String> {
    let output = git(repo_dir, &["rev-parse", "--short", "HEAD"])?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RelguardError::GitError(format!(
            "git rev-parse --short HEAD failed: {}",
            stderr.trim()
        )));
    }

    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if sha.is_empty() {
        return Err(RelguardError::GitError(
            "git rev-parse --short HEAD returned empty output".to_string(),
        ));
    }

    Ok(sha)
}

/// The tag pointing exactly at HEAD, if any.
///
/// `git describe --tags --exact-match` exits nonzero when HEAD is untagged;
/// that is the common case and yields `None`, not an error.
pub fn exact_tag(repo_dir: &Path) -> Option<String> {
    let output = git(repo_dir, &["describe", "--tags", "--exact-match", "HEAD"]).ok()?;
    if !output.status.success() {
        debug!("HEAD has no exact tag");
        return None;
    }
    let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!tag.is_empty()).then_some(tag)
}

/// Put `path` back to its content at HEAD (`git checkout HEAD -- <path>`).
pub fn restore_from_head(repo_dir: &Path, path: &Path) -> Result<()> {
    let path_arg = path.to_string_lossy();
    let output = git(repo_dir, &["checkout", "HEAD", "--", path_arg.as_ref()])?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RelguardError::GitError(format!(
            "git checkout HEAD -- {} failed: {}",
            path.display(),
            stderr.trim()
        )));
    }
    Ok(())
}

/// Resolve `name` inside the repository's git directory
/// (`git rev-parse --git-path <name>`), anchored at `repo_dir`.
pub fn git_path(repo_dir: &Path, name: &str) -> Result<PathBuf> {
    let output = git(repo_dir, &["rev-parse", "--git-path", name])?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RelguardError::GitError(format!(
            "git rev-parse --git-path {name} failed: {}",
            stderr.trim()
        )));
    }

    let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    Ok(repo_dir.join(path))
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
        run_git(dir.path(), &["config", "tag.gpgsign", "false"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[test]
    fn capture_short_sha_returns_hex() {
        let repo = make_git_repo();
        let sha = capture_short_sha(repo.path()).unwrap();
        assert!(sha.len() >= 4 && sha.len() < 40, "unexpected short sha: {sha}");
        assert!(sha.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn capture_short_sha_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(capture_short_sha(dir.path()).is_err());
    }

    #[test]
    fn capture_short_sha_fails_without_commits() {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        assert!(capture_short_sha(dir.path()).is_err());
    }

    #[test]
    fn exact_tag_none_when_untagged() {
        let repo = make_git_repo();
        assert_eq!(exact_tag(repo.path()), None);
    }

    #[test]
    fn exact_tag_finds_lightweight_tag() {
        let repo = make_git_repo();
        run_git(repo.path(), &["tag", "1.2.0"]);
        assert_eq!(exact_tag(repo.path()).as_deref(), Some("1.2.0"));
    }

    #[test]
    fn exact_tag_ignores_tags_on_older_commits() {
        let repo = make_git_repo();
        run_git(repo.path(), &["tag", "1.2.0"]);
        run_git(repo.path(), &["commit", "--allow-empty", "-m", "next"]);
        assert_eq!(exact_tag(repo.path()), None);
    }

    #[test]
    fn restore_from_head_reverts_edits() {
        let repo = make_git_repo();
        let file = repo.path().join("about.py");
        std::fs::write(&file, "__version__ = \"1.0.0\"\n").unwrap();
        run_git(repo.path(), &["add", "about.py"]);
        run_git(repo.path(), &["commit", "-m", "add about"]);

        std::fs::write(&file, "__version__ = \"9.9.9\"\n").unwrap();
        restore_from_head(repo.path(), Path::new("about.py")).unwrap();
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "__version__ = \"1.0.0\"\n"
        );
    }

    #[test]
    fn restore_from_head_fails_for_untracked_file() {
        let repo = make_git_repo();
        std::fs::write(repo.path().join("loose.py"), "x").unwrap();
        assert!(restore_from_head(repo.path(), Path::new("loose.py")).is_err());
    }

    #[test]
    fn git_path_points_into_git_dir() {
        let repo = make_git_repo();
        let path = git_path(repo.path(), "relguard.lock").unwrap();
        assert_eq!(path.file_name().unwrap(), "relguard.lock");
        assert!(path.parent().unwrap().ends_with(".git"));
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn git_path_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(git_path(dir.path(), "relguard.lock").is_err());
    }

    #[test]
    fn is_git_repo_true_for_repo() {
        let repo = make_git_repo();
        assert!(is_git_repo(repo.path()));
    }

    #[test]
    fn is_git_repo_false_for_non_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(dir.path()));
    }
}
