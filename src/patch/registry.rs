//! Ordered module-registry patching
//!
//! Maintains the `return [` ... `];` block of a registry file such as
//! `config/bundles.php`, one `Name::class => ['all' => true],` line per entry,
//! sorted lexicographically.

use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;

use super::{join_lines, split_lines};
use crate::error::{Error, Result};

const BLOCK_OPEN: &str = "return [";
const BLOCK_CLOSE: &str = "];";
const DEFAULT_INDENT: &str = "    ";

/// Backslash-separated identifiers
static QUALIFIED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\\[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("Invalid qualified name regex")
});

fn validate_name(name: &str) -> Result<()> {
    if !QUALIFIED_NAME.is_match(name) {
        return Err(Error::format(
            "registry entry",
            format!("'{}' is not a qualified class name", name),
        ));
    }
    Ok(())
}

/// Locate the opening and closing line of the list block.
fn locate_block(lines: &[String]) -> Result<(usize, usize)> {
    let open = lines
        .iter()
        .position(|line| line.trim_end() == BLOCK_OPEN)
        .ok_or_else(|| Error::format("registry file", format!("'{}' not found", BLOCK_OPEN)))?;
    let close = lines[open + 1..]
        .iter()
        .position(|line| line.trim() == BLOCK_CLOSE)
        .map(|offset| open + 1 + offset)
        .ok_or_else(|| Error::format("registry file", format!("'{}' not found", BLOCK_CLOSE)))?;
    Ok((open, close))
}

fn entry_token(name: &str) -> String {
    format!("{}::class", name)
}

fn is_entry_of(line: &str, name: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix(&entry_token(name))
        .is_some_and(|rest| rest.is_empty() || !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}

/// Insert `name` into the registry block, keeping entries sorted.
///
/// Returns the content unchanged if the entry is already registered.
pub fn add_entry(content: &str, name: &str) -> Result<String> {
    validate_name(name)?;
    let mut lines = split_lines(content);
    let (open, close) = locate_block(&lines)?;

    if lines[open + 1..close].iter().any(|line| is_entry_of(line, name)) {
        info!("{} is already registered, skipping", name);
        return Ok(content.to_string());
    }

    let indent = if open + 1 == close {
        DEFAULT_INDENT.to_string()
    } else {
        let next = &lines[open + 1];
        next[..next.len() - next.trim_start().len()].to_string()
    };
    let entry = format!("{}{} => ['all' => true],", indent, entry_token(name));

    let insert_at = (open + 1..close)
        .find(|&idx| lines[idx].trim() > entry.trim())
        .unwrap_or(close);

    debug!("Inserting {} at line {}", name, insert_at + 1);
    lines.insert(insert_at, entry);
    Ok(join_lines(&lines))
}

/// Remove every entry line for `name` from the registry block.
pub fn remove_entry(content: &str, name: &str) -> Result<String> {
    validate_name(name)?;
    let mut lines = split_lines(content);
    let (open, close) = locate_block(&lines)?;

    let before = lines.len();
    let mut idx = 0;
    lines.retain(|line| {
        let inside = idx > open && idx < close;
        idx += 1;
        !(inside && is_entry_of(line, name))
    });

    if lines.len() == before {
        return Err(Error::not_found(format!("registry entry {}", name)));
    }
    info!("Removed {} from registry", name);
    Ok(join_lines(&lines))
}
