//! # Unit Manifest Schema and Parsing
//!
//! A unit that does not register a directive routine in code can ship a
//! `copycat.yaml` manifest in its root directory. The manifest is a list of
//! directives, replayed in order against whichever patch context the run
//! uses, so the same file drives both install and uninstall.
//!
//! ## Format
//!
//! ```yaml
//! - copy:
//!     target: ddev-commands-web
//!     file: resources/ddev/acme-cache
//!     ignore: true
//! - document:
//!     target: composer-json
//!     path: extra.acme-cache
//!     value: { ttl: 300 }
//! - ignore:
//!     entries: [var/acme-cache/]
//! - env:
//!     target: local
//!     entries:
//!       ACME_CACHE_DSN: redis://localhost
//! - registry:
//!     name: Acme\Cache\AcmeCacheBundle
//! - settings:
//!     service: Acme\Cache\Warmer
//!     arguments: { $ttl: 300 }
//! ```
//!
//! Every directive is an externally tagged map with kebab-case keys. Unknown
//! keys are rejected.

use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

use crate::context::{CopyOptions, PatchContext};
use crate::error::{Error, Result};
use crate::target::{CopyTarget, DocumentTarget, EnvTarget};
use crate::unit::Unit;

fn default_true() -> bool {
    true
}

/// Copy directive
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyOp {
    pub target: CopyTarget,
    /// File shipped by the unit, relative to its root or source directory
    pub file: String,
    #[serde(default = "default_true")]
    pub overwrite: bool,
    /// List the copied file in the unit's ignore group
    #[serde(default)]
    pub ignore: bool,
    #[serde(default, rename = "create-dir")]
    pub create_dir: bool,
}

/// Structured-document value directive
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentOp {
    pub target: DocumentTarget,
    /// Dot-separated path, e.g. `extra.acme`
    pub path: String,
    pub value: JsonValue,
    #[serde(default)]
    pub overwrite: bool,
}

/// Ignore-list directive
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoreOp {
    pub entries: Vec<String>,
}

/// Env file directive
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvOp {
    pub target: EnvTarget,
    /// Key/value pairs in file order
    #[serde(deserialize_with = "ordered_entries")]
    pub entries: Vec<(String, String)>,
    #[serde(default)]
    pub overwrite: bool,
}

/// Module-registry directive
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryOp {
    pub name: String,
}

/// Service settings directive
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsOp {
    pub service: String,
    #[serde(default)]
    pub arguments: Map<String, JsonValue>,
}

/// All directives a manifest can contain
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Directive {
    Copy(CopyOp),
    Document(DocumentOp),
    Ignore(IgnoreOp),
    Env(EnvOp),
    Registry(RegistryOp),
    Settings(SettingsOp),
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Copy(_) => "copy",
            Directive::Document(_) => "document",
            Directive::Ignore(_) => "ignore",
            Directive::Env(_) => "env",
            Directive::Registry(_) => "registry",
            Directive::Settings(_) => "settings",
        }
    }

    /// Issue this directive against a context.
    pub fn issue(&self, ctx: &mut dyn PatchContext) {
        match self {
            Directive::Copy(op) => ctx.copy(
                op.target,
                &op.file,
                CopyOptions {
                    overwrite: op.overwrite,
                    ignore: op.ignore,
                    create_target_dir: op.create_dir,
                },
            ),
            Directive::Document(op) => {
                ctx.document_add(op.target, &op.path, op.value.clone(), op.overwrite)
            }
            Directive::Ignore(op) => ctx.ignore_add(&op.entries),
            Directive::Env(op) => ctx.env_add(op.target, &op.entries, op.overwrite),
            Directive::Registry(op) => ctx.registry_add(&op.name),
            Directive::Settings(op) => ctx.settings_add(&op.service, &op.arguments),
        }
    }
}

/// Read a YAML map of scalars into ordered string pairs.
fn ordered_entries<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    let mapping = serde_yaml::Mapping::deserialize(deserializer)?;
    mapping
        .iter()
        .map(|(key, value)| {
            let key = scalar_string(key)
                .ok_or_else(|| D::Error::custom("env entry keys must be scalars"))?;
            let value = scalar_string(value).ok_or_else(|| {
                D::Error::custom(format!("env entry '{}' must have a scalar value", key))
            })?;
            Ok((key, value))
        })
        .collect()
}

fn scalar_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

/// A parsed unit manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    directives: Vec<Directive>,
}

impl Manifest {
    pub fn new(directives: Vec<Directive>) -> Self {
        Self { directives }
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Parse manifest YAML. An empty document is an empty manifest.
    pub fn parse(yaml_content: &str) -> Result<Self> {
        if yaml_content.trim().is_empty() {
            return Ok(Self::default());
        }
        let directives: Vec<Directive> =
            serde_yaml::from_str(yaml_content).map_err(|e| Error::Config {
                message: format!("invalid unit manifest: {}", e),
                hint: Some(
                    "Each entry must be one of: copy, document, ignore, env, registry, settings"
                        .to_string(),
                ),
            })?;
        Ok(Self { directives })
    }

    /// Parse a manifest file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content).map_err(|e| match e {
            Error::Config { message, hint } => Error::Config {
                message: format!("{}: {}", path.as_ref().display(), message),
                hint,
            },
            other => other,
        })
    }
}

impl Unit for Manifest {
    fn run(&self, ctx: &mut dyn PatchContext) {
        for directive in &self.directives {
            log::debug!("Manifest directive: {}", directive.name());
            directive.issue(ctx);
        }
    }
}
