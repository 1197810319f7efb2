//! The version declaration file: a single `key = "value"` line.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::domain::error::{RelguardError, Result};

/// A parsed version declaration.
///
/// Holds the full original text so substitution can reproduce every other
/// byte unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDeclaration {
    path: PathBuf,
    key: String,
    content: String,
    line_index: usize,
    version: String,
}

fn key_line_pattern(key: &str) -> Result<Regex> {
    Regex::new(&format!(
        r#"^(\s*){}\s*=\s*"([^"]*)"\s*$"#,
        regex::escape(key)
    ))
    .map_err(|e| RelguardError::Config(format!("invalid declaration key {key:?}: {e}")))
}

/// Split a line into its body and its terminator (`\n`, `\r\n` or nothing).
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

impl VersionDeclaration {
    /// Read and parse the declaration at `path`.
    pub fn load(path: &Path, key: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| RelguardError::path_io(path, e))?;
        Self::parse(path, key, content)
    }

    /// Parse declaration text. Exactly one line may match the key.
    pub fn parse(path: &Path, key: &str, content: String) -> Result<Self> {
        let pattern = key_line_pattern(key)?;

        let mut found: Option<(usize, String)> = None;
        let mut count = 0usize;
        for (idx, line) in content.split_inclusive('\n').enumerate() {
            let (body, _) = split_terminator(line);
            if let Some(caps) = pattern.captures(body) {
                count += 1;
                if found.is_none() {
                    found = Some((idx, caps[2].to_string()));
                }
            }
        }

        match (found, count) {
            (Some((line_index, version)), 1) => Ok(Self {
                path: path.to_path_buf(),
                key: key.to_string(),
                content,
                line_index,
                version,
            }),
            (None, _) => Err(RelguardError::DeclarationKeyMissing {
                key: key.to_string(),
                path: path.to_path_buf(),
            }),
            (Some(_), count) => Err(RelguardError::AmbiguousDeclaration {
                key: key.to_string(),
                path: path.to_path_buf(),
                count,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The declared (base) version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The file content as it was read.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Content with the key line rewritten to carry `version`.
    ///
    /// Leading indentation and the line terminator are kept; every other line
    /// is copied through untouched.
    pub fn with_version(&self, version: &str) -> String {
        let mut out = String::with_capacity(self.content.len() + version.len());
        for (idx, line) in self.content.split_inclusive('\n').enumerate() {
            if idx == self.line_index {
                let (body, terminator) = split_terminator(line);
                let indent_len = body.len() - body.trim_start().len();
                out.push_str(&body[..indent_len]);
                out.push_str(&format!("{} = \"{}\"", self.key, version));
                out.push_str(terminator);
            } else {
                out.push_str(line);
            }
        }
        out
    }
}
