//! Phases of an install or uninstall run.
//!
//! ## Overview
//!
//! A run follows 4 steps:
//! 1. Settings - Load the project's namespace whitelist
//! 2. Discovery - Enumerate installed units and resolve their routines
//! 3. Patching - Run each routine under the forward or reverse context,
//!    staging every change in one shared file store
//! 4. Flush - Write the staged changes to disk once (skipped in dry-run mode)
//!
//! Directive failures never stop a run. Only settings and discovery errors
//! abort it, before anything has been written.

use std::fmt;

pub mod discovery;
pub mod orchestrator;

/// Direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Apply directives (install)
    Apply,
    /// Undo directives (uninstall)
    Revert,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Apply => write!(f, "apply"),
            Mode::Revert => write!(f, "revert"),
        }
    }
}
