//! # Units
//!
//! A unit is an installed package that contributes patch directives to the
//! host project. This module holds the immutable [`UnitDescriptor`] produced
//! by discovery, the [`Unit`] trait implemented by directive routines, and
//! the [`UnitRegistry`] used to link a discovered namespace to its routine
//! without any runtime type inspection.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::context::PatchContext;

/// Identity and location data of one contributing unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    namespace: String,
    unit_root: PathBuf,
    source_dir: PathBuf,
    project_root: PathBuf,
    package_name: String,
}

impl UnitDescriptor {
    /// Create a descriptor. Trailing separators are trimmed from every path
    /// and trailing namespace separators (`\`) from the namespace key.
    pub fn new(
        namespace: impl Into<String>,
        project_root: impl AsRef<Path>,
        source_dir: impl AsRef<Path>,
        unit_root: impl AsRef<Path>,
        package_name: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: namespace.trim_end_matches('\\').to_string(),
            unit_root: trim_separators(unit_root.as_ref()),
            source_dir: trim_separators(source_dir.as_ref()),
            project_root: trim_separators(project_root.as_ref()),
            package_name: package_name.into(),
        }
    }

    /// Key used to tag the blocks this unit owns in shared files.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The unit's own installation directory.
    pub fn unit_root(&self) -> &Path {
        &self.unit_root
    }

    /// Declared source subdirectory of the unit.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Root of the host project being patched.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Stable package name (`vendor/package`).
    pub fn package_name(&self) -> &str {
        &self.package_name
    }
}

impl fmt::Display for UnitDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.namespace, self.package_name)
    }
}

fn trim_separators(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() && !raw.is_empty() {
        // the filesystem root itself
        return path.to_path_buf();
    }
    PathBuf::from(trimmed)
}

/// A directive routine. Implementations issue zero or more directive calls
/// against the context; whether those calls apply or revert is decided by the
/// context, so one routine serves both install and uninstall.
pub trait Unit {
    fn run(&self, ctx: &mut dyn PatchContext);
}

impl<F> Unit for F
where
    F: Fn(&mut dyn PatchContext),
{
    fn run(&self, ctx: &mut dyn PatchContext) {
        self(ctx)
    }
}

/// Statically registered directive routines keyed by namespace.
#[derive(Default, Clone)]
pub struct UnitRegistry {
    units: HashMap<String, Arc<dyn Unit>>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a routine for a namespace, replacing any earlier registration.
    pub fn register(&mut self, namespace: &str, unit: impl Unit + 'static) {
        self.units.insert(
            namespace.trim_end_matches('\\').to_string(),
            Arc::new(unit),
        );
    }

    pub fn get(&self, namespace: &str) -> Option<Arc<dyn Unit>> {
        self.units.get(namespace).cloned()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.units.keys().collect();
        names.sort();
        f.debug_struct("UnitRegistry").field("units", &names).finish()
    }
}

/// A descriptor paired with its resolved routine, if the unit has one.
#[derive(Clone)]
pub struct DiscoveredUnit {
    pub descriptor: UnitDescriptor,
    pub routine: Option<Arc<dyn Unit>>,
}

impl DiscoveredUnit {
    pub fn new(descriptor: UnitDescriptor, routine: Option<Arc<dyn Unit>>) -> Self {
        Self {
            descriptor,
            routine,
        }
    }
}

impl fmt::Debug for DiscoveredUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredUnit")
            .field("descriptor", &self.descriptor)
            .field("has_routine", &self.routine.is_some())
            .finish()
    }
}
