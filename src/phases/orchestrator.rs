//! Orchestrator for install and uninstall runs
//!
//! This module ties settings, discovery, patching and flush together into the
//! two public entry points, [`execute_install`] and [`execute_uninstall`].

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::{discovery, Mode};
use crate::context::{Apply, DirectiveFailure, PatchContext, Report, Revert};
use crate::error::Result;
use crate::filesystem::FileStore;
use crate::path::canonical_or_normalized;
use crate::patch::Stats;
use crate::settings::ProjectSettings;
use crate::unit::{DiscoveredUnit, UnitRegistry};

/// Options shared by install and uninstall runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stage everything but write nothing
    pub dry_run: bool,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub units_run: usize,
    pub units_without_directives: usize,
    pub directives_succeeded: usize,
    pub directives_failed: usize,
    pub failures: Vec<DirectiveFailure>,
    /// Added/skipped lines of block-style directives
    pub stats: Stats,
    pub files_written: usize,
    pub files_removed: usize,
    /// Files that would have changed, populated in dry-run mode
    pub pending_files: Vec<PathBuf>,
}

impl RunSummary {
    fn record(&mut self, report: Report) {
        self.directives_succeeded += report.succeeded;
        self.directives_failed += report.failed();
        self.stats.added += report.stats.added;
        self.stats.skipped += report.stats.skipped;
        self.failures.extend(report.failures);
    }
}

/// Run every unit's routine in `mode` against the shared store.
///
/// Units are processed in the given order. Nothing is written here.
pub fn run_units(units: &[DiscoveredUnit], mode: Mode, store: &mut FileStore) -> RunSummary {
    let mut summary = RunSummary::default();

    for unit in units {
        let Some(routine) = &unit.routine else {
            debug!("{} has no directives", unit.descriptor);
            summary.units_without_directives += 1;
            continue;
        };

        info!("Running {} ({})", unit.descriptor, mode);
        let mut report = Report::new();
        {
            let descriptor = &unit.descriptor;
            let mut ctx: Box<dyn PatchContext + '_> = match mode {
                Mode::Apply => Box::new(Apply::new(descriptor, store, &mut report)),
                Mode::Revert => Box::new(Revert::new(descriptor, store, &mut report)),
            };
            routine.run(ctx.as_mut());
        }

        if report.stats.added + report.stats.skipped > 0 {
            info!("  {}", report.stats);
        }
        summary.units_run += 1;
        summary.record(report);
    }

    summary
}

/// Install: apply the directives of every discovered unit.
pub fn execute_install(
    project_root: &Path,
    registry: &UnitRegistry,
    options: RunOptions,
) -> Result<RunSummary> {
    let project_root = canonical_or_normalized(project_root);
    let settings = ProjectSettings::load(&project_root)?;
    let units = discovery::execute(&project_root, &settings, registry)?;

    let mut store = FileStore::new();
    let mut summary = run_units(&units, Mode::Apply, &mut store);
    finish(&mut store, &mut summary, options)?;
    Ok(summary)
}

/// Uninstall: revert the directives of the units of one package.
///
/// An unknown package is logged and yields an empty summary.
pub fn execute_uninstall(
    project_root: &Path,
    registry: &UnitRegistry,
    package_name: &str,
    options: RunOptions,
) -> Result<RunSummary> {
    let project_root = canonical_or_normalized(project_root);
    let settings = ProjectSettings::load(&project_root)?;
    let units: Vec<DiscoveredUnit> = discovery::execute(&project_root, &settings, registry)?
        .into_iter()
        .filter(|unit| unit.descriptor.package_name() == package_name)
        .collect();

    if units.is_empty() {
        info!("No units found for package {}", package_name);
        return Ok(RunSummary::default());
    }

    let mut store = FileStore::new();
    let mut summary = run_units(&units, Mode::Revert, &mut store);
    finish(&mut store, &mut summary, options)?;
    Ok(summary)
}

fn finish(store: &mut FileStore, summary: &mut RunSummary, options: RunOptions) -> Result<()> {
    if summary.directives_failed > 0 {
        warn!("{} directive(s) failed", summary.directives_failed);
    }

    if options.dry_run {
        summary.pending_files = store.pending_paths().into_iter().cloned().collect();
        info!(
            "Dry run: {} file(s) would change",
            summary.pending_files.len()
        );
        store.discard();
        return Ok(());
    }

    let flushed = store.flush_all()?;
    summary.files_written = flushed.written;
    summary.files_removed = flushed.removed;
    info!(
        "Wrote {} file(s), removed {} file(s)",
        flushed.written, flushed.removed
    );
    Ok(())
}
