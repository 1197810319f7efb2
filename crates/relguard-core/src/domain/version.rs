//! Version classification and derivation.
//!
//! These are pure functions over already-gathered repository facts. Gathering
//! the facts (reading the declaration, asking git) lives in
//! [`crate::resolver`].

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::error::{RelguardError, Result};

/// Which rule produced the resolved version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "branch", content = "tag", rename_all = "snake_case")]
pub enum ResolvedBranch {
    /// The revision carries an exact `MAJOR.MINOR.PATCH` tag.
    UseTag(String),

    /// No usable tag; derive from the declared base and the short hash.
    UseDerived,
}

/// The version string embedded for the duration of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    pub value: String,
    pub branch: ResolvedBranch,
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn release_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("static regex"))
}

/// Whether `tag` is a strict `MAJOR.MINOR.PATCH` release tag.
///
/// `v1.2.3`, `1.2` and `1.2.3-rc1` are all rejected.
pub fn is_release_tag(tag: &str) -> bool {
    release_tag_pattern().is_match(tag)
}

/// Pick the resolution branch from the exact-tag query result.
pub fn classify_version(tag: Option<&str>) -> ResolvedBranch {
    match tag {
        Some(tag) if is_release_tag(tag) => ResolvedBranch::UseTag(tag.to_string()),
        _ => ResolvedBranch::UseDerived,
    }
}

/// Interpret a short revision hash as a hexadecimal integer.
pub fn short_hash_to_int(short_hash: &str) -> Result<u64> {
    let trimmed = short_hash.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RelguardError::InvalidShortHash(short_hash.to_string()));
    }
    u64::from_str_radix(trimmed, 16)
        .map_err(|_| RelguardError::InvalidShortHash(short_hash.to_string()))
}

/// `<base>-<decimal value of short_hash>`.
pub fn derive_version(base: &str, short_hash: &str) -> Result<String> {
    let sha_int = short_hash_to_int(short_hash)?;
    Ok(format!("{base}-{sha_int}"))
}

/// Combine the branch decision with the base and hash into the final string.
///
/// The short hash is only consulted on the derived branch, but callers must
/// still have resolved it: a repository without commits is fatal either way.
pub fn resolve_version(base: &str, tag: Option<&str>, short_hash: &str) -> Result<ResolvedVersion> {
    let branch = classify_version(tag);
    let value = match &branch {
        ResolvedBranch::UseTag(tag) => tag.clone(),
        ResolvedBranch::UseDerived => derive_version(base, short_hash)?,
    };
    Ok(ResolvedVersion { value, branch })
}
