//! Version resolution against scratch git repositories.

use relguard_core::{resolve, RelguardError, ResolvedBranch, VersionDeclaration};
use std::path::{Path, PathBuf};
use std::process::Command;

fn run_git(repo_dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
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
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn make_repo(base: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init"]);
    run_git(dir.path(), &["config", "user.name", "test-user"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
    run_git(dir.path(), &["config", "tag.gpgsign", "false"]);
    let path = dir.path().join("__about__.py");
    std::fs::write(&path, format!("__version__ = \"{base}\"\n")).unwrap();
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-m", "initial"]);
    (dir, path)
}

fn load(path: &Path) -> VersionDeclaration {
    VersionDeclaration::load(path, "__version__").unwrap()
}

#[test]
fn exact_release_tag_wins() {
    let (repo, path) = make_repo("0.9.0");
    run_git(repo.path(), &["tag", "2.3.1"]);

    let resolved = resolve(repo.path(), &load(&path)).unwrap();
    assert_eq!(resolved.value, "2.3.1");
    assert_eq!(resolved.branch, ResolvedBranch::UseTag("2.3.1".to_string()));
}

#[test]
fn annotated_release_tag_wins() {
    let (repo, path) = make_repo("0.9.0");
    run_git(repo.path(), &["tag", "-a", "3.0.0", "-m", "release"]);

    let resolved = resolve(repo.path(), &load(&path)).unwrap();
    assert_eq!(resolved.value, "3.0.0");
}

#[test]
fn untagged_revision_derives_from_short_hash() {
    let (repo, path) = make_repo("0.1.0");
    let short = run_git(repo.path(), &["rev-parse", "--short", "HEAD"]);
    let expected = format!("0.1.0-{}", u64::from_str_radix(&short, 16).unwrap());

    let resolved = resolve(repo.path(), &load(&path)).unwrap();
    assert_eq!(resolved.value, expected);
    assert_eq!(resolved.branch, ResolvedBranch::UseDerived);
}

#[test]
fn incomplete_tag_is_ignored() {
    let (repo, path) = make_repo("0.1.0");
    run_git(repo.path(), &["tag", "2.3"]);

    let resolved = resolve(repo.path(), &load(&path)).unwrap();
    assert_eq!(resolved.branch, ResolvedBranch::UseDerived);
    assert!(resolved.value.starts_with("0.1.0-"));
}

#[test]
fn repository_without_commits_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init"]);
    let path = dir.path().join("__about__.py");
    std::fs::write(&path, "__version__ = \"0.1.0\"\n").unwrap();

    let err = resolve(dir.path(), &load(&path)).unwrap_err();
    assert!(matches!(err, RelguardError::GitError(_)));
}
