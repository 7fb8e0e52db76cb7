//! # copycat
//!
//! A declarative, idempotent patch engine. Installed packages (units)
//! contribute directives that patch files of the host project: copy a file
//! into a well-known directory, set a value in `composer.json` or a YAML
//! config, add lines to `.gitignore` or an env file, register a bundle or a
//! service. Every directive can be reverted, so one routine serves both
//! install and uninstall.
//!
//! ## Quick Example
//!
//! ```
//! use copycat::patch::markers;
//!
//! let (content, stats) =
//!     markers::add_lines("/vendor/\n", &["var/cache/".to_string()], "Acme\\Cache").unwrap();
//! assert_eq!(
//!     content,
//!     "/vendor/\n\n###> Acme\\Cache\nvar/cache/\n###< Acme\\Cache\n"
//! );
//! assert_eq!(stats.added, 1);
//!
//! // running it again changes nothing
//! let (again, stats) = markers::add_lines(&content, &["var/cache/".to_string()], "Acme\\Cache").unwrap();
//! assert_eq!(again, content);
//! assert_eq!(stats.skipped, 1);
//! ```
//!
//! ## Core Concepts
//!
//! - **Units (`unit`)**: a [`unit::UnitDescriptor`] describes an installed
//!   package namespace; its routine implements [`unit::Unit`] and is found
//!   through a [`unit::UnitRegistry`] or a `copycat.yaml` manifest (`config`).
//! - **File store (`filesystem`)**: every read and write of a run goes through
//!   one buffer that is flushed to disk once, at the end.
//! - **Patchers (`patch`)**: pure text transforms for structured documents,
//!   marker-delimited groups, the bundle registry and the services block.
//! - **Contexts (`context`)**: the forward ([`context::Apply`]) and reverse
//!   ([`context::Revert`]) interpreters of the directive set.
//! - **Phases (`phases`)**: settings, discovery, patching and flush, wired
//!   together by `phases::orchestrator`.
//!
//! A failing directive is logged and skipped; the rest of the run continues.

pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod output;
pub mod patch;
pub mod path;
pub mod phases;
pub mod settings;
pub mod system;
pub mod target;
pub mod unit;

#[cfg(test)]
mod patch_proptest;
