//! # CLI Command Implementations
//!
//! One module per subcommand of the `copycat` tool. Each module holds an
//! `Args` struct derived with `clap` and an `execute` function that calls
//! into the `copycat` library and prints the result.

pub mod completions;
pub mod install;
pub mod list;
pub mod uninstall;

use copycat::output::Output;
use copycat::path::display_relative;
use copycat::phases::orchestrator::RunSummary;
use std::path::Path;

/// Print the report of an install or uninstall run.
pub(crate) fn print_summary(summary: &RunSummary, output: &Output, project_root: &Path, dry_run: bool) {
    println!(
        "Units: {} run, {} without directives",
        summary.units_run, summary.units_without_directives
    );

    let failed = format!("{} failed", summary.directives_failed);
    println!(
        "Directives: {} succeeded, {}",
        summary.directives_succeeded,
        if summary.directives_failed > 0 {
            output.failure(failed)
        } else {
            failed
        }
    );
    for failure in &summary.failures {
        println!("  {}", output.failure(failure));
    }

    if summary.stats.added + summary.stats.skipped > 0 {
        println!("Lines: {}", summary.stats);
    }

    if dry_run {
        println!(
            "{}",
            output.heading(format!(
                "Dry run: {} file(s) would change",
                summary.pending_files.len()
            ))
        );
        for path in &summary.pending_files {
            println!("  {}", output.muted(display_relative(path, project_root)));
        }
    } else {
        println!(
            "{}",
            output.success(format!(
                "Files: {} written, {} removed",
                summary.files_written, summary.files_removed
            ))
        );
    }
}
