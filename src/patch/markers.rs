//! Marker-delimited line groups
//!
//! A group is a run of lines between `###> <name>` and `###< <name>`, owned
//! by one unit. Groups are created at end of file, filled idempotently and
//! removed as a whole. Lines outside the group are never reordered.

use std::sync::LazyLock;

use log::{debug, info};
use regex::Regex;

use super::{join_lines, split_lines, Stats};
use crate::error::{Error, Result};

pub const GROUP_START: &str = "###> ";
pub const GROUP_END: &str = "###< ";

static BARE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_./-]+$").expect("Invalid bare value regex"));

fn start_sentinel(group: &str) -> String {
    format!("{}{}", GROUP_START, group)
}

fn end_sentinel(group: &str) -> String {
    format!("{}{}", GROUP_END, group)
}

/// Find the start and end line index of `group`.
fn locate(lines: &[String], group: &str) -> Result<Option<(usize, usize)>> {
    let start = start_sentinel(group);
    let end = end_sentinel(group);

    let Some(start_idx) = lines.iter().position(|line| line.trim_end() == start) else {
        return Ok(None);
    };

    match lines[start_idx + 1..]
        .iter()
        .position(|line| line.trim_end() == end)
    {
        Some(offset) => Ok(Some((start_idx, start_idx + 1 + offset))),
        None => Err(Error::format(
            format!("group '{}'", group),
            "start marker found without a matching end marker",
        )),
    }
}

/// Lines of `content` without trailing blank lines.
fn content_lines(content: &str) -> Vec<String> {
    let mut lines = split_lines(content);
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// Locate `group`, appending an empty one at end of file if it is missing.
fn locate_or_append(lines: &mut Vec<String>, group: &str) -> Result<(usize, usize)> {
    if let Some(range) = locate(lines, group)? {
        return Ok(range);
    }

    debug!("Creating group '{}'", group);
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(start_sentinel(group));
    lines.push(end_sentinel(group));
    Ok((lines.len() - 2, lines.len() - 1))
}

/// Append raw lines to `group`, skipping lines it already contains.
pub fn add_lines(content: &str, entries: &[String], group: &str) -> Result<(String, Stats)> {
    let mut lines = content_lines(content);
    let (start, end) = locate_or_append(&mut lines, group)?;

    let mut group_lines: Vec<String> = lines[start + 1..end].to_vec();
    let mut stats = Stats::default();
    for entry in entries {
        if group_lines.iter().any(|line| line == entry) {
            stats.skipped += 1;
        } else {
            group_lines.push(entry.clone());
            stats.added += 1;
        }
    }

    lines.splice(start + 1..end, group_lines);
    info!("Group '{}': {}", group, stats);
    Ok((join_lines(&lines), stats))
}

/// Key of a `KEY=value` line, ignoring comments.
fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    trimmed.split_once('=').map(|(key, _)| key.trim())
}

fn has_key(line: &str, key: &str) -> bool {
    line_key(line).is_some_and(|k| k.to_uppercase() == key)
}

/// Render a `KEY=value` line. Values outside `[A-Za-z0-9_./-]` are quoted.
pub fn env_line(key: &str, value: &str) -> String {
    let key = key.to_uppercase();
    if BARE_VALUE.is_match(value) {
        return format!("{}={}", key, value);
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '$' => escaped.push_str("\\$"),
            other => escaped.push(other),
        }
    }
    format!("{}=\"{}\"", key, escaped)
}

/// Add `KEY=value` lines to `group`.
///
/// Lines outside the group that carry one of the incoming keys are moved
/// into it first. An existing key inside the group is replaced with
/// `overwrite` and skipped otherwise. Keys match case-insensitively and are
/// written upper-cased.
pub fn add_keyed_lines(
    content: &str,
    entries: &[(String, String)],
    group: &str,
    overwrite: bool,
) -> Result<(String, Stats)> {
    let mut lines = content_lines(content);
    let (start, end) = locate_or_append(&mut lines, group)?;

    let mut after = lines.split_off(end);
    let mut group_lines = lines.split_off(start + 1);
    let mut before = lines;

    let mut stats = Stats::default();
    for (key, value) in entries {
        let key = key.to_uppercase();

        let mut relocate = |outside: &mut Vec<String>| {
            outside.retain(|line| {
                if has_key(line, &key) {
                    debug!("Moving existing entry {} into group '{}'", key, group);
                    group_lines.push(line.clone());
                    false
                } else {
                    true
                }
            });
        };
        relocate(&mut before);
        // `after` starts with the end marker, which never matches a key
        relocate(&mut after);

        let exists = group_lines.iter().any(|line| has_key(line, &key));
        if exists && !overwrite {
            debug!("Entry {} already exists in group '{}', skipping", key, group);
            stats.skipped += 1;
            continue;
        }
        if exists {
            debug!("Entry {} already exists in group '{}', overwriting", key, group);
            group_lines.retain(|line| !has_key(line, &key));
        }
        group_lines.push(env_line(&key, value));
        stats.added += 1;
    }

    before.extend(group_lines);
    before.extend(after);
    info!("Group '{}': {}", group, stats);
    Ok((join_lines(&before), stats))
}

/// Delete `group` including its markers.
pub fn remove_group(content: &str, group: &str) -> Result<String> {
    let mut lines = content_lines(content);
    let (start, end) = locate(&lines, group)?
        .ok_or_else(|| Error::not_found(format!("group '{}'", group)))?;

    lines.drain(start..=end);
    // drop the blank separator that preceded the group, unless it still
    // separates two non-blank lines
    let separator_before = start > 0 && lines[start - 1].is_empty();
    let blank_or_eof_after = lines.get(start).is_none_or(|line| line.is_empty());
    if separator_before && blank_or_eof_after {
        lines.remove(start - 1);
    }
    Ok(join_lines(&lines))
}

/// Whether `content` contains a complete `group`.
pub fn has_group(content: &str, group: &str) -> bool {
    matches!(locate(&split_lines(content), group), Ok(Some(_)))
}
