//! Phase 1: Discovery
//!
//! Enumerates the units installed in the project and links each one to its
//! directive routine.
//!
//! ## Process
//!
//! 1.  **Enumeration (`discover_units`)**: every `vendor/<vendor>/<package>`
//!     directory with a `composer.json` is read in sorted order. Each
//!     namespace of its `autoload.psr-4` map becomes one [`UnitDescriptor`],
//!     provided the namespace passes the project's whitelist. A namespace
//!     mapped to several source directories is skipped.
//!
//! 2.  **Routine resolution (`resolve_routines`)**: a routine registered in
//!     the [`UnitRegistry`] under the unit's namespace wins. Otherwise a
//!     `copycat.yaml` manifest in the package root is used, attached to the
//!     package's first namespace only. Units with neither get no routine.
//!
//! A missing `vendor/` directory is fatal. Unreadable package directories
//! (dangling symlinks included) and manifests are skipped with a warning.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value as JsonValue;
use walkdir::WalkDir;

use crate::config::Manifest;
use crate::defaults::{PACKAGE_MANIFEST, UNIT_MANIFEST, VENDOR_DIR};
use crate::error::{Error, Result};
use crate::settings::ProjectSettings;
use crate::unit::{DiscoveredUnit, Unit, UnitDescriptor, UnitRegistry};

/// Executes Phase 1: enumerate units and resolve their routines.
pub fn execute(
    project_root: &Path,
    settings: &ProjectSettings,
    registry: &UnitRegistry,
) -> Result<Vec<DiscoveredUnit>> {
    let descriptors = discover_units(project_root, settings)?;
    info!("Discovered {} unit(s)", descriptors.len());
    Ok(resolve_routines(descriptors, registry))
}

/// Enumerate unit descriptors from the project's dependency directory.
pub fn discover_units(project_root: &Path, settings: &ProjectSettings) -> Result<Vec<UnitDescriptor>> {
    let vendor = project_root.join(VENDOR_DIR);
    if !vendor.is_dir() {
        return Err(Error::not_found(format!(
            "dependency directory {}",
            vendor.display()
        )));
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(&vendor)
        .min_depth(2)
        .max_depth(2)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map_or_else(|| vendor.clone(), Path::to_path_buf);
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let package_dir = entry.path();
        let Some(package_name) = package_name(&vendor, package_dir) else {
            continue;
        };

        let manifest = package_dir.join(PACKAGE_MANIFEST);
        if !manifest.is_file() {
            debug!("No {} in {}", PACKAGE_MANIFEST, package_dir.display());
            continue;
        }

        match read_autoload(&manifest) {
            Ok(namespaces) => {
                for (namespace, source) in namespaces {
                    if !settings.allows(&namespace) {
                        info!("Namespace {} is not whitelisted, skipping", namespace);
                        continue;
                    }
                    units.push(UnitDescriptor::new(
                        namespace,
                        project_root,
                        package_dir.join(source.trim_end_matches('/')),
                        package_dir,
                        package_name.clone(),
                    ));
                }
            }
            Err(e) => warn!("Skipping package {}: {}", package_name, e),
        }
    }

    Ok(units)
}

/// `vendor/package` name of a package directory.
fn package_name(vendor: &Path, package_dir: &Path) -> Option<String> {
    let relative = package_dir.strip_prefix(vendor).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    match parts.as_slice() {
        [vendor_name, package] => Some(format!("{}/{}", vendor_name, package)),
        _ => None,
    }
}

/// Read `autoload.psr-4` as (namespace, source path) pairs in file order.
fn read_autoload(manifest: &Path) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(manifest)?;
    let root: JsonValue = serde_json::from_str(&content)?;

    let Some(psr4) = root
        .get("autoload")
        .and_then(|autoload| autoload.get("psr-4"))
        .and_then(JsonValue::as_object)
    else {
        return Ok(Vec::new());
    };

    let mut namespaces = Vec::new();
    for (namespace, path) in psr4 {
        let source = match path {
            JsonValue::String(path) => path.clone(),
            JsonValue::Array(paths) if paths.len() == 1 => match paths[0].as_str() {
                Some(path) => path.to_string(),
                None => continue,
            },
            JsonValue::Array(_) => {
                warn!(
                    "Multiple paths for namespace {} in {}, skipping",
                    namespace,
                    manifest.display()
                );
                continue;
            }
            _ => continue,
        };
        namespaces.push((namespace.clone(), source));
    }
    Ok(namespaces)
}

/// Link each descriptor to its directive routine.
pub fn resolve_routines(descriptors: Vec<UnitDescriptor>, registry: &UnitRegistry) -> Vec<DiscoveredUnit> {
    let mut manifest_roots: HashSet<PathBuf> = HashSet::new();

    descriptors
        .into_iter()
        .map(|descriptor| {
            let routine = registry.get(descriptor.namespace()).or_else(|| {
                if !manifest_roots.insert(descriptor.unit_root().to_path_buf()) {
                    return None;
                }
                load_manifest(&descriptor)
            });
            DiscoveredUnit::new(descriptor, routine)
        })
        .collect()
}

fn load_manifest(descriptor: &UnitDescriptor) -> Option<Arc<dyn Unit>> {
    let path = descriptor.unit_root().join(UNIT_MANIFEST);
    if !path.is_file() {
        return None;
    }
    match Manifest::from_file(&path) {
        Ok(manifest) => {
            debug!(
                "Loaded {} directive(s) from {}",
                manifest.directives().len(),
                path.display()
            );
            Some(Arc::new(manifest))
        }
        Err(e) => {
            warn!("Ignoring manifest of {}: {}", descriptor, e);
            None
        }
    }
}
