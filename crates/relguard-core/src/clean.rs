//! Workspace cleaning: remove caches and build output by name.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::error::{RelguardError, Result};
use crate::guard::{remove_stale_lock, restore_declaration};

/// How an entry name is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameMatch {
    Exact(&'static str),
    Prefix(&'static str),
    Suffix(&'static str),
}

impl NameMatch {
    fn matches(self, name: &str) -> bool {
        match self {
            NameMatch::Exact(s) => name == s,
            NameMatch::Prefix(s) => name.starts_with(s),
            NameMatch::Suffix(s) => name.ends_with(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

/// One removable kind of entry.
#[derive(Debug, Clone, Copy)]
struct CleanTarget {
    kind: EntryKind,
    name: NameMatch,
    /// Only match directly under the workspace root.
    root_only: bool,
}

const fn dir(name: NameMatch) -> CleanTarget {
    CleanTarget {
        kind: EntryKind::Dir,
        name,
        root_only: false,
    }
}

const fn file(name: NameMatch) -> CleanTarget {
    CleanTarget {
        kind: EntryKind::File,
        name,
        root_only: false,
    }
}

const TARGETS: &[CleanTarget] = &[
    // bytecode
    dir(NameMatch::Exact("__pycache__")),
    file(NameMatch::Suffix(".pyc")),
    file(NameMatch::Suffix(".pyo")),
    // coverage
    file(NameMatch::Exact(".coverage")),
    file(NameMatch::Prefix(".coverage.")),
    file(NameMatch::Exact("coverage.xml")),
    dir(NameMatch::Exact("htmlcov")),
    // tool caches
    dir(NameMatch::Exact(".mypy_cache")),
    dir(NameMatch::Exact(".pytest_cache")),
    dir(NameMatch::Exact(".ruff_cache")),
    // build output
    dir(NameMatch::Exact("build")),
    dir(NameMatch::Exact("dist")),
    dir(NameMatch::Suffix(".egg-info")),
    // generated resumes
    CleanTarget {
        kind: EntryKind::File,
        name: NameMatch::Suffix(".pdf"),
        root_only: true,
    },
];

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &[".git", ".venv", "venv", "node_modules"];

fn is_target(name: &str, kind: EntryKind, at_root: bool) -> bool {
    TARGETS
        .iter()
        .any(|t| t.kind == kind && (!t.root_only || at_root) && t.name.matches(name))
}

/// What a clean run removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
}

/// Recursively delete cache and build entries under `root`.
///
/// Entries that vanish mid-walk are ignored. Other removal failures are
/// logged and skipped; cleaning is best-effort.
pub fn clean_workspace(root: &Path) -> Result<CleanReport> {
    let mut report = CleanReport::default();
    walk(root, true, &mut report)?;
    info!(removed = report.removed.len(), "workspace cleaned");
    Ok(report)
}

fn walk(dir: &Path, at_root: bool, report: &mut CleanReport) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(RelguardError::path_io(dir, e)),
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        // symlinks are matched as files and never followed
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if is_dir {
            if SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            if is_target(&name, EntryKind::Dir, at_root) {
                remove(&path, EntryKind::Dir, report);
            } else {
                walk(&path, false, report)?;
            }
        } else if is_target(&name, EntryKind::File, at_root) {
            remove(&path, EntryKind::File, report);
        }
    }
    Ok(())
}

fn remove(path: &Path, kind: EntryKind, report: &mut CleanReport) {
    let result = match kind {
        EntryKind::Dir => std::fs::remove_dir_all(path),
        EntryKind::File => std::fs::remove_file(path),
    };
    match result {
        Ok(()) => {
            debug!(path = %path.display(), "removed");
            report.removed.push(path.to_path_buf());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove"),
    }
}

/// `clean`: delete caches, put the version declaration back from HEAD and
/// drop a build lock left by an aborted build.
///
/// A failed restore is logged, not returned; the declaration may simply not
/// be tracked yet.
pub fn clean(root: &Path, declaration: &Path) -> Result<CleanReport> {
    let report = clean_workspace(root)?;
    if let Err(e) = restore_declaration(root, declaration, None) {
        warn!(error = %e, "could not restore version declaration");
    }
    if let Err(e) = remove_stale_lock(root) {
        debug!(error = %e, "no build lock to remove");
    }
    Ok(report)
}
