//! System precondition guard
//!
//! Patches aimed at a specific host system (Symfony, DDEV, git, Composer)
//! only run against projects that show that system's indicator path.

use log::debug;

use crate::error::{Error, Result};
use crate::target::{IndicatorKind, KnownSystem};
use crate::unit::UnitDescriptor;

/// Check that the unit's project uses `required`. A missing requirement passes.
pub fn validate(unit: &UnitDescriptor, required: Option<KnownSystem>) -> Result<()> {
    let Some(system) = required else {
        return Ok(());
    };

    let indicator = unit.project_root().join(system.indicator());
    let present = match system.indicator_kind() {
        IndicatorKind::File => indicator.is_file(),
        IndicatorKind::Directory => indicator.is_dir(),
    };

    if !present {
        return Err(Error::PreconditionFailed {
            system: system.name().to_string(),
            indicator: system.indicator().to_string(),
        });
    }

    debug!("System {} detected for {}", system, unit);
    Ok(())
}
