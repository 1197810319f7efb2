//! A `relguard build` killed with SIGTERM or SIGHUP still restores the
//! declaration and releases its lock.

#![cfg(unix)]

use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const DECLARATION: &str = "src/neatresume/__about__.py";
const COMMITTED: &str = "__version__ = \"1.0.0\"\n";

fn run_git(repo_dir: &Path, args: &[&str]) {
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
}

fn make_package_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init"]);
    run_git(dir.path(), &["config", "user.name", "test-user"]);
    run_git(dir.path(), &["config", "user.email", "test@example.com"]);
    run_git(dir.path(), &["config", "commit.gpgsign", "false"]);

    let path = dir.path().join(DECLARATION);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, COMMITTED).unwrap();
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-m", "initial"]);

    std::fs::write(
        dir.path().join("relguard.toml"),
        "[tools]\nclean_build_state = [\"true\"]\npackage = [\"sh\", \"-c\", \"exec sleep 30\"]\n",
    )
    .unwrap();
    dir
}

fn spawn_build(repo: &Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_relguard"))
        .args(["build", "--workspace"])
        .arg(repo)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn declaration(repo: &Path) -> String {
    std::fs::read_to_string(repo.join(DECLARATION)).unwrap()
}

fn wait_until_stamped(repo: &Path) {
    let deadline = Instant::now() + Duration::from_secs(20);
    while declaration(repo) == COMMITTED {
        assert!(Instant::now() < deadline, "build never stamped the declaration");
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn wait_for_exit(child: &mut Child) -> ExitStatus {
    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() >= deadline {
            child.kill().unwrap();
            panic!("relguard did not exit after the signal");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn send_signal(child: &Child, signal: &str) {
    let status = Command::new("kill")
        .args([signal, &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

fn assert_signal_restores(signal: &str, expected_code: i32) {
    let repo = make_package_repo();
    let mut child = spawn_build(repo.path());

    wait_until_stamped(repo.path());
    send_signal(&child, signal);
    let status = wait_for_exit(&mut child);

    assert_eq!(status.code(), Some(expected_code));
    assert_eq!(declaration(repo.path()), COMMITTED);
    assert!(!repo.path().join(".git/relguard.lock").exists());

    // the next build is not blocked
    let mut retry = spawn_build(repo.path());
    wait_until_stamped(repo.path());
    send_signal(&retry, signal);
    assert_eq!(wait_for_exit(&mut retry).code(), Some(expected_code));
    assert_eq!(declaration(repo.path()), COMMITTED);
}

#[test]
fn test_sigterm_restores_declaration() {
    assert_signal_restores("-TERM", 143);
}

#[test]
fn test_sighup_restores_declaration() {
    assert_signal_restores("-HUP", 129);
}
