//! Content patchers
//!
//! Pure text and value-tree transformations used by the patch contexts. None
//! of them touch the filesystem; the contexts load content from the
//! [`FileStore`](crate::filesystem::FileStore), run a patcher and store the
//! result back.
//!
//! ## Patchers
//!
//! - [`document`] - path-addressed set/remove over JSON and YAML documents
//! - [`markers`] - named line groups in ignore-lists and env files
//! - [`registry`] - sorted entries in the module-registry file
//! - [`settings`] - keyed records in a top-level settings block
//! - [`copy`] - planning of buffered file copies

pub mod copy;
pub mod document;
pub mod markers;
pub mod registry;
pub mod settings;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A dot-separated address inside a structured document, e.g. `extra.acme.mode`.
///
/// Segments are matched by exact, case-sensitive string equality. An empty
/// address or one with empty segments is rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathAddress {
    segments: Vec<String>,
}

impl PathAddress {
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::format("document path", "path must not be empty"));
        }

        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::format(
                "document path",
                format!("path '{}' contains an empty segment", path),
            ));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this address equals `prefix` or lies below it, segment-wise.
    pub fn starts_with(&self, prefix: &PathAddress) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl FromStr for PathAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Added/skipped counts reported by block-style patchers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub added: usize,
    pub skipped: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "added {}, skipped {}", self.added, self.skipped)
    }
}

/// Split text into lines, accepting CRLF and LF endings alike.
pub(crate) fn split_lines(content: &str) -> Vec<String> {
    content
        .replace("\r\n", "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}

/// Join lines, trim trailing blank lines and end with exactly one newline.
pub(crate) fn join_lines(lines: &[String]) -> String {
    let joined = lines.join("\n");
    let trimmed = joined.trim_end_matches('\n');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}\n", trimmed)
}
