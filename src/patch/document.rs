//! Structured-document patching
//!
//! Path-addressed set and remove over parsed JSON and YAML value trees. The
//! walk is shared through the [`Node`] trait, implemented for both
//! `serde_json::Value` and `serde_yaml::Value`.
//!
//! ## Semantics
//!
//! - `set` creates missing intermediate maps. A null intermediate is replaced
//!   by an empty map; any other non-map intermediate is replaced only with
//!   `overwrite`, otherwise the walk fails with a conflict naming the prefix.
//! - A final location holding a non-empty value is only replaced with
//!   `overwrite`. Null, empty strings, empty maps and empty sequences count
//!   as empty.
//! - Lists are replaced wholesale, never merged element-wise.
//! - `remove` deletes the final key only. Intermediate maps that become empty
//!   are left in place.

use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use super::PathAddress;
use crate::error::{Error, Result};
use crate::target::{DocumentFormat, DocumentTarget};

/// A map-like value tree that can be walked by key.
pub trait Node: Sized {
    fn empty_map() -> Self;
    fn is_null(&self) -> bool;
    fn is_map(&self) -> bool;
    /// Null, empty string, empty map or empty sequence.
    fn is_empty_value(&self) -> bool;
    /// Child under `key`, if this is a map that contains it.
    fn child_mut(&mut self, key: &str) -> Option<&mut Self>;
    /// Child under `key`, inserting null if missing. `None` if not a map.
    fn entry(&mut self, key: &str) -> Option<&mut Self>;
    /// Remove `key` keeping the order of the remaining entries.
    fn remove_key(&mut self, key: &str) -> Option<Self>;
}

impl Node for JsonValue {
    fn empty_map() -> Self {
        JsonValue::Object(serde_json::Map::new())
    }

    fn is_null(&self) -> bool {
        JsonValue::is_null(self)
    }

    fn is_map(&self) -> bool {
        self.is_object()
    }

    fn is_empty_value(&self) -> bool {
        match self {
            JsonValue::Null => true,
            JsonValue::String(s) => s.is_empty(),
            JsonValue::Array(items) => items.is_empty(),
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Bool(_) | JsonValue::Number(_) => false,
        }
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut Self> {
        self.as_object_mut()?.get_mut(key)
    }

    fn entry(&mut self, key: &str) -> Option<&mut Self> {
        Some(
            self.as_object_mut()?
                .entry(key.to_string())
                .or_insert(JsonValue::Null),
        )
    }

    fn remove_key(&mut self, key: &str) -> Option<Self> {
        self.as_object_mut()?.shift_remove(key)
    }
}

impl Node for YamlValue {
    fn empty_map() -> Self {
        YamlValue::Mapping(serde_yaml::Mapping::new())
    }

    fn is_null(&self) -> bool {
        YamlValue::is_null(self)
    }

    fn is_map(&self) -> bool {
        self.is_mapping()
    }

    fn is_empty_value(&self) -> bool {
        match self {
            YamlValue::Null => true,
            YamlValue::String(s) => s.is_empty(),
            YamlValue::Sequence(items) => items.is_empty(),
            YamlValue::Mapping(map) => map.is_empty(),
            _ => false,
        }
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut Self> {
        self.as_mapping_mut()?.get_mut(key)
    }

    fn entry(&mut self, key: &str) -> Option<&mut Self> {
        Some(
            self.as_mapping_mut()?
                .entry(YamlValue::String(key.to_string()))
                .or_insert(YamlValue::Null),
        )
    }

    fn remove_key(&mut self, key: &str) -> Option<Self> {
        self.as_mapping_mut()?.shift_remove(key)
    }
}

fn prefix_name(path: &PathAddress, depth: usize) -> String {
    if depth == 0 {
        "<root>".to_string()
    } else {
        path.segments()[..depth].join(".")
    }
}

/// Assign `value` at `path`, creating intermediate maps as needed.
pub fn set<N: Node>(document: &mut N, path: &PathAddress, value: N, overwrite: bool) -> Result<()> {
    let mut current = document;

    for (depth, segment) in path.segments().iter().enumerate() {
        if !current.is_map() {
            if current.is_null() || overwrite {
                *current = N::empty_map();
            } else {
                return Err(Error::conflict(
                    prefix_name(path, depth),
                    "existing value is not a map",
                ));
            }
        }

        current = current.entry(segment).ok_or_else(|| {
            Error::conflict(prefix_name(path, depth), "existing value is not a map")
        })?;
    }

    if !overwrite && !current.is_empty_value() {
        return Err(Error::conflict(
            path.to_string(),
            "a value is already set and overwrite is disabled",
        ));
    }

    *current = value;
    Ok(())
}

/// Delete the final key of `path`. Every segment must already exist.
pub fn remove<N: Node>(document: &mut N, path: &PathAddress) -> Result<()> {
    let Some((last, parents)) = path.segments().split_last() else {
        return Err(Error::format("document path", "path must not be empty"));
    };

    let mut current = document;
    for (depth, segment) in parents.iter().enumerate() {
        current = current
            .child_mut(segment)
            .ok_or_else(|| Error::not_found(format!("'{}'", prefix_name(path, depth + 1))))?;
    }

    current
        .remove_key(last)
        .map(|_| ())
        .ok_or_else(|| Error::not_found(format!("'{}'", path)))
}

/// Reject paths outside the target's allow-list.
pub fn check_allowed_paths(target: DocumentTarget, path: &PathAddress) -> Result<()> {
    let Some(prefixes) = target.allowed_prefixes() else {
        return Ok(());
    };

    for prefix in prefixes {
        let prefix = PathAddress::parse(prefix)?;
        if path.starts_with(&prefix) {
            return Ok(());
        }
    }

    Err(Error::policy(format!(
        "path '{}' is outside the allowed paths of {} ({})",
        path,
        target.file(),
        prefixes.join(", ")
    )))
}

/// A parsed document in its native value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Json(JsonValue),
    Yaml(YamlValue),
}

impl Document {
    /// Parse `text`. Blank input is an empty map.
    pub fn parse(format: DocumentFormat, text: &str) -> Result<Self> {
        let blank = text.trim().is_empty();
        match format {
            DocumentFormat::Json if blank => Ok(Document::Json(JsonValue::empty_map())),
            DocumentFormat::Json => Ok(Document::Json(serde_json::from_str(text)?)),
            DocumentFormat::Yaml if blank => Ok(Document::Yaml(YamlValue::empty_map())),
            DocumentFormat::Yaml => Ok(Document::Yaml(serde_yaml::from_str(text)?)),
        }
    }

    /// Render with a single trailing newline. JSON uses 4-space indentation.
    pub fn render(&self) -> Result<String> {
        let rendered = match self {
            Document::Json(value) => {
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
                let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
                value.serialize(&mut serializer)?;
                String::from_utf8(buf)
                    .map_err(|_| Error::format("json document", "rendered output is not UTF-8"))?
            }
            Document::Yaml(value) => serde_yaml::to_string(value)?,
        };
        Ok(format!("{}\n", rendered.trim_end_matches('\n')))
    }

    pub fn set(&mut self, path: &PathAddress, value: &JsonValue, overwrite: bool) -> Result<()> {
        match self {
            Document::Json(document) => set(document, path, value.clone(), overwrite),
            Document::Yaml(document) => {
                let value = serde_yaml::to_value(value)?;
                set(document, path, value, overwrite)
            }
        }
    }

    pub fn remove(&mut self, path: &PathAddress) -> Result<()> {
        match self {
            Document::Json(document) => remove(document, path),
            Document::Yaml(document) => remove(document, path),
        }
    }
}
