//! # List Command Implementation
//!
//! Read-only listing of the units discovered in the project, in run order.
//! Each line shows the namespace, the package and whether the unit carries
//! directives.

use anyhow::{Context, Result};
use clap::Args;

use copycat::path::canonical_or_normalized;
use copycat::phases::discovery;
use copycat::settings::ProjectSettings;
use copycat::unit::UnitRegistry;

use crate::cli::GlobalArgs;

/// List discovered units
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show units that carry directives
    #[arg(long)]
    pub with_directives: bool,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let project_root = canonical_or_normalized(&global.project_root);
    let settings = ProjectSettings::load(&project_root).context("Failed to load project settings")?;
    let units = discovery::execute(&project_root, &settings, &UnitRegistry::new())
        .context("Failed to discover units")?;

    let output = &global.output;
    let mut shown = 0;
    for unit in &units {
        let has_directives = unit.routine.is_some();
        if args.with_directives && !has_directives {
            continue;
        }
        let marker = if has_directives {
            output.success("directives")
        } else {
            output.muted("-")
        };
        println!(
            "{}  {}  {}",
            unit.descriptor.namespace(),
            output.muted(unit.descriptor.package_name()),
            marker
        );
        shown += 1;
    }

    if shown == 0 {
        println!("No units found");
    }
    Ok(())
}
