//! # Uninstall Command Implementation
//!
//! Reverts the directives of the units belonging to one package. Copied
//! files are deleted, marker groups are removed and registry entries are
//! unregistered. An unknown package is not an error.

use anyhow::{Context, Result};
use clap::Args;

use copycat::phases::orchestrator::{self, RunOptions};
use copycat::unit::UnitRegistry;

use crate::cli::GlobalArgs;

/// Revert the directives of one package
#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Package name, as `vendor/package`
    #[arg(value_name = "PACKAGE")]
    pub package: String,

    /// Show what would change without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Execute the `uninstall` command.
pub fn execute(args: UninstallArgs, global: &GlobalArgs) -> Result<()> {
    let registry = UnitRegistry::new();
    let summary = orchestrator::execute_uninstall(
        &global.project_root,
        &registry,
        &args.package,
        RunOptions {
            dry_run: args.dry_run,
        },
    )
    .with_context(|| format!("Uninstall of {} failed", args.package))?;

    if summary.units_run + summary.units_without_directives == 0 {
        println!("No units found for package {}", args.package);
        return Ok(());
    }

    super::print_summary(&summary, &global.output, &global.project_root, args.dry_run);
    Ok(())
}
