//! # Patch Contexts
//!
//! A unit's directive routine is written once against the [`PatchContext`]
//! trait. Two interpreters give it meaning:
//!
//! - [`Apply`] performs each directive (install and update runs)
//! - [`Revert`] undoes each directive (uninstall runs)
//!
//! ## Failure isolation
//!
//! Directive methods return nothing. Every call is wrapped: an error is
//! logged with the directive name, recorded in the run's [`Report`] and the
//! routine continues with its next directive. A failed directive never stops
//! other directives or other units from being buffered and flushed.

mod apply;
mod revert;

pub use apply::Apply;
pub use revert::Revert;

use std::fmt;

use log::warn;
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::patch::Stats;
use crate::target::{CopyTarget, DocumentTarget, EnvTarget};
use crate::unit::UnitDescriptor;

/// Options of a copy directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    /// Replace an existing destination file
    pub overwrite: bool,
    /// Also list the copied file in the unit's ignore group
    pub ignore: bool,
    /// Create the target directory if it is missing
    pub create_target_dir: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            ignore: false,
            create_target_dir: false,
        }
    }
}

/// The directives a unit can issue.
pub trait PatchContext {
    /// The unit the directives are issued for
    fn unit(&self) -> &UnitDescriptor;

    /// Copy a file shipped by the unit into a project directory.
    fn copy(&mut self, target: CopyTarget, file: &str, options: CopyOptions);

    /// Set a value at a dot-separated path of a structured document.
    fn document_add(&mut self, target: DocumentTarget, path: &str, value: JsonValue, overwrite: bool);

    /// Add lines to the unit's group in the project ignore-list.
    fn ignore_add(&mut self, entries: &[String]);

    /// Add `KEY=value` entries to the unit's group in an env file.
    fn env_add(&mut self, target: EnvTarget, entries: &[(String, String)], overwrite: bool);

    /// Register a module in the project's registry file.
    fn registry_add(&mut self, name: &str);

    /// Declare a service record in the project's service settings.
    fn settings_add(&mut self, service: &str, arguments: &Map<String, JsonValue>);
}

/// A directive that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveFailure {
    pub unit: String,
    pub directive: &'static str,
    pub message: String,
}

impl fmt::Display for DirectiveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.unit, self.directive, self.message)
    }
}

/// Outcome of all directives of a run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub succeeded: usize,
    pub failures: Vec<DirectiveFailure>,
    /// Added/skipped counts summed over block-style directives
    pub stats: Stats,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub(crate) fn add_stats(&mut self, stats: Stats) {
        self.stats.added += stats.added;
        self.stats.skipped += stats.skipped;
    }

    /// Record the outcome of one directive, logging failures.
    pub(crate) fn finish(&mut self, unit: &UnitDescriptor, directive: &'static str, result: Result<()>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(e) => {
                warn!("{} error for {}: {}", directive, unit, e);
                self.failures.push(DirectiveFailure {
                    unit: unit.to_string(),
                    directive,
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Settings record body for a service with `arguments`.
pub(crate) fn service_attributes(arguments: &Map<String, JsonValue>) -> Result<serde_yaml::Mapping> {
    let mut attributes = serde_yaml::Mapping::new();
    if !arguments.is_empty() {
        attributes.insert(
            serde_yaml::Value::String("arguments".to_string()),
            serde_yaml::to_value(arguments)?,
        );
    }
    Ok(attributes)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_copy_options_default() {
        let options = CopyOptions::default();
        assert!(options.overwrite);
        assert!(!options.ignore);
        assert!(!options.create_target_dir);
    }

    #[test]
    fn test_report_finish_records_failures() {
        let unit = UnitDescriptor::new("Acme\\Cache", "/p", "/p/s", "/p/u", "acme/cache");
        let mut report = Report::new();
        report.finish(&unit, "copy", Ok(()));
        report.finish(&unit, "registry_add", Err(Error::not_found("config/bundles.php")));

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].directive, "registry_add");
        assert!(report.failures[0].to_string().contains("Acme\\Cache (acme/cache) [registry_add]"));
    }

    #[test]
    fn test_report_failure_is_logged() {
        testing_logger::setup();
        let unit = UnitDescriptor::new("Acme\\Cache", "/p", "/p/s", "/p/u", "acme/cache");
        let mut report = Report::new();
        report.finish(&unit, "env_add", Err(Error::not_found(".env.local")));

        testing_logger::validate(|captured_logs| {
            assert_eq!(captured_logs.len(), 1);
            assert_eq!(captured_logs[0].level, log::Level::Warn);
            assert!(captured_logs[0].body.contains("env_add error"));
            assert!(captured_logs[0].body.contains(".env.local"));
        });
    }

    #[test]
    fn test_service_attributes() {
        let mut arguments = Map::new();
        arguments.insert("$ttl".to_string(), JsonValue::from(300));
        let attributes = service_attributes(&arguments).unwrap();
        let rendered = serde_yaml::to_string(&attributes).unwrap();
        assert_eq!(rendered, "arguments:\n  $ttl: 300\n");
        assert!(service_attributes(&Map::new()).unwrap().is_empty());
    }
}
