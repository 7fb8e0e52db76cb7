//! # Install Command Implementation
//!
//! Runs every discovered unit forward: settings are loaded, units are
//! discovered under `vendor/`, their directives are staged and the result is
//! flushed once. Directive failures are reported but do not change the exit
//! status; only setup errors (settings, discovery) do.

use anyhow::{Context, Result};
use clap::Args;

use copycat::phases::orchestrator::{self, RunOptions};
use copycat::unit::UnitRegistry;

use crate::cli::GlobalArgs;

/// Apply the directives of every installed unit
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Show what would change without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Execute the `install` command.
pub fn execute(args: InstallArgs, global: &GlobalArgs) -> Result<()> {
    let registry = UnitRegistry::new();
    let summary = orchestrator::execute_install(
        &global.project_root,
        &registry,
        RunOptions {
            dry_run: args.dry_run,
        },
    )
    .with_context(|| format!("Install failed in {}", global.project_root.display()))?;

    super::print_summary(&summary, &global.output, &global.project_root, args.dry_run);
    Ok(())
}
