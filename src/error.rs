//! # Error Handling
//!
//! This module defines the centralized error type for the patch engine. It
//! uses the `thiserror` library to create an `Error` enum that covers every
//! way a directive or a run can fail.
//!
//! ## Error Kinds
//!
//! - **`NotFound`**: a file, document path, marker group or registry entry
//!   does not exist.
//! - **`ScopeViolation`**: a resolved path escapes the root it is allowed to
//!   live under (the unit's own package, or the project outside `vendor/`).
//! - **`Conflict`**: an existing value would be overwritten without
//!   permission.
//! - **`PolicyViolation`**: a document path lies outside the target's
//!   allow-list, or a reverse patch hits a target that forbids removal.
//! - **`PreconditionFailed`**: the project does not use the system a target
//!   requires.
//! - **`Format`**: an otherwise readable file lacks the markers a patcher
//!   expects.
//! - **`Config`**: the project settings or a unit manifest are malformed.
//!
//! Directive-level errors are caught and logged by the patch contexts; only
//! `Config` and discovery failures abort a run.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for copycat operations
#[derive(Error, Debug)]
pub enum Error {
    /// A file, path, group or entry that was required is missing.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// A resolved path lies outside the directory it must stay within.
    #[error("Scope violation: {}: {message}", path.display())]
    ScopeViolation { path: PathBuf, message: String },

    /// An existing value would be replaced without permission.
    #[error("Conflict at '{location}': {message}")]
    Conflict { location: String, message: String },

    /// A patch touches something its target does not permit.
    #[error("Policy violation: {message}")]
    PolicyViolation { message: String },

    /// The project does not look like a project of the required system.
    #[error("Precondition failed: project does not appear to be a {system} project ({indicator} missing)")]
    PreconditionFailed { system: String, indicator: String },

    /// Expected markers or structure are missing from a file.
    #[error("Format error in {context}: {message}")]
    Format { context: String, message: String },

    /// The project settings or a unit manifest could not be understood.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An operation that has no implementation in this mode.
    #[error("Feature not implemented: {feature}")]
    NotImplemented { feature: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing or rendering error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing or rendering error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    pub(crate) fn conflict(location: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Conflict {
            location: location.into(),
            message: message.into(),
        }
    }

    pub(crate) fn format(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Format {
            context: context.into(),
            message: message.into(),
        }
    }

    pub(crate) fn scope(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::ScopeViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn policy(message: impl Into<String>) -> Self {
        Error::PolicyViolation {
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let error = Error::not_found("group 'acme' in .gitignore");
        let display = format!("{}", error);
        assert!(display.contains("Not found"));
        assert!(display.contains("group 'acme'"));
    }

    #[test]
    fn test_error_display_scope_violation() {
        let error = Error::scope("/etc/passwd", "outside of /project/vendor/acme/cache");
        let display = format!("{}", error);
        assert!(display.contains("Scope violation"));
        assert!(display.contains("/etc/passwd"));
        assert!(display.contains("outside of /project/vendor/acme/cache"));
    }

    #[test]
    fn test_error_display_conflict() {
        let error = Error::conflict("extra.acme", "value already present");
        let display = format!("{}", error);
        assert!(display.contains("Conflict at 'extra.acme'"));
        assert!(display.contains("value already present"));
    }

    #[test]
    fn test_error_display_precondition() {
        let error = Error::PreconditionFailed {
            system: "symfony".to_string(),
            indicator: "config/bundles.php".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("symfony project"));
        assert!(display.contains("config/bundles.php missing"));
    }

    #[test]
    fn test_error_display_config_with_hint() {
        let error = Error::Config {
            message: "whitelistedNamespaces must be a list".to_string(),
            hint: Some("Use a JSON array of namespace prefixes".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("hint:"));
        assert!(display.contains("JSON array"));
    }

    #[test]
    fn test_error_display_config_without_hint() {
        let error = Error::Config {
            message: "bad".to_string(),
            hint: None,
        };
        assert!(!format!("{}", error).contains("hint:"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML error"));
    }

    #[test]
    fn test_error_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(format!("{}", error).contains("JSON error"));
    }
}
