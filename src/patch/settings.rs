//! Keyed records inside a top-level YAML block
//!
//! Splices a `key: {attributes}` record into a block such as the `services:`
//! section of `config/services.yaml` without re-serializing the rest of the
//! file, so comments and formatting outside the new record survive.

use std::sync::LazyLock;

use log::info;
use regex::Regex;
use serde_yaml::{Mapping, Value as YamlValue};

use super::{join_lines, split_lines};
use crate::error::Result;

const DEFAULT_INDENT: usize = 4;
/// Indentation serde_yaml emits per nesting level
const YAML_LEVEL: usize = 2;

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_block_line(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with([' ', '\t'])
}

fn declares_key(line: &str, key: &str) -> bool {
    let trimmed = line.trim();
    [key.to_string(), format!("'{}'", key), format!("\"{}\"", key)]
        .iter()
        .any(|candidate| {
            trimmed
                .strip_prefix(candidate.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
        })
}

/// Line opening a literal or folded block scalar, e.g. `$script: |-`.
static BLOCK_SCALAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[:-] )[|>][0-9]?[-+]?[0-9]?$").expect("Invalid block scalar regex")
});

/// Serialize the record and re-indent it one level below the header.
///
/// Nesting levels are widened from serde_yaml's two spaces to `unit`. Lines
/// inside a sequence entry keep their offset from the dash, and block scalar
/// content keeps its exact offset from the line that opened it.
fn render_record(key: &str, attributes: &Mapping, unit: usize) -> Result<Vec<String>> {
    let body = if attributes.is_empty() {
        YamlValue::Null
    } else {
        YamlValue::Mapping(attributes.clone())
    };
    let mut record = Mapping::new();
    record.insert(YamlValue::String(key.to_string()), body);
    let rendered = serde_yaml::to_string(&record)?;

    // (rendered indent, output indent, opens a sequence entry)
    let mut parents: Vec<(usize, usize, bool)> = Vec::new();
    // (rendered indent, output indent) of an open block scalar
    let mut scalar: Option<(usize, usize)> = None;
    let mut lines = Vec::new();

    for line in rendered.lines() {
        let depth = indentation(line);
        if let Some((from, to)) = scalar {
            if line.trim().is_empty() {
                lines.push(String::new());
                continue;
            }
            if depth > from {
                lines.push(format!("{}{}", " ".repeat(to), line.get(from..).unwrap_or(line)));
                continue;
            }
            scalar = None;
        }

        while parents.last().is_some_and(|&(from, _, _)| from > depth) {
            parents.pop();
        }
        let target = match parents.last() {
            Some(&(from, to, _)) if from == depth => to,
            Some(&(from, to, true)) => to + (depth - from),
            Some(&(from, to, false)) => to + (depth - from) * unit / YAML_LEVEL,
            None => unit,
        };
        if parents.last().is_some_and(|&(from, _, _)| from == depth) {
            parents.pop();
        }

        let text = line.trim_start();
        parents.push((depth, target, text.starts_with("- ")));
        if BLOCK_SCALAR.is_match(text.trim_end()) {
            scalar = Some((depth, target));
        }
        lines.push(format!("{}{}", " ".repeat(target), text));
    }
    Ok(lines)
}

/// Add a `key` record to the block opened by `header`.
///
/// The header is appended at end of file if missing. Returns `false` with
/// the content unchanged if the block already declares `key`.
pub fn add_block(
    content: &str,
    header: &str,
    key: &str,
    attributes: &Mapping,
) -> Result<(String, bool)> {
    let mut lines = split_lines(content);
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let header_idx = match lines.iter().position(|line| line.trim_end() == header) {
        Some(idx) => idx,
        None => {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(header.to_string());
            lines.len() - 1
        }
    };

    let block_end = lines[header_idx + 1..]
        .iter()
        .position(|line| !is_block_line(line))
        .map_or(lines.len(), |offset| header_idx + 1 + offset);
    let block = &lines[header_idx + 1..block_end];

    let unit = block
        .iter()
        .find(|line| !line.trim().is_empty())
        .map(|line| indentation(line))
        .filter(|&width| width > 0)
        .unwrap_or(DEFAULT_INDENT);

    if block
        .iter()
        .any(|line| indentation(line) == unit && declares_key(line, key))
    {
        info!("{} is already declared under {}, skipping", key, header);
        return Ok((content.to_string(), false));
    }

    // insert after the last non-blank line of the block
    let insert_at = block
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(header_idx + 1, |offset| header_idx + 1 + offset + 1);

    let mut record = Vec::new();
    if insert_at > header_idx + 1 {
        record.push(String::new());
    }
    record.extend(render_record(key, attributes, unit)?);
    if lines.get(insert_at).is_some_and(|line| !line.trim().is_empty()) {
        record.push(String::new());
    }

    lines.splice(insert_at..insert_at, record);
    info!("Added {} under {}", key, header);
    Ok((join_lines(&lines), true))
}
