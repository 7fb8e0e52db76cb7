//! Reverse interpreter: undoes each directive of a unit.
//!
//! | Directive | Reverse effect |
//! |---|---|
//! | `copy` | delete the copied file (and the unit's ignore group if the copy was ignored) |
//! | `document_add` | remove the value, on removable targets only |
//! | `ignore_add` | remove the unit's ignore group |
//! | `env_add` | remove the unit's group, skipping a missing env file |
//! | `registry_add` | remove the registry entry |
//! | `settings_add` | not supported |

use std::collections::HashSet;
use std::path::PathBuf;

use log::{debug, info};
use serde_json::{Map, Value as JsonValue};

use super::{CopyOptions, PatchContext, Report};
use crate::defaults::{IGNORE_FILE, REGISTRY_FILE, SERVICES_FILE};
use crate::error::{Error, Result};
use crate::filesystem::FileStore;
use crate::patch::copy::copied_destination;
use crate::patch::document::{check_allowed_paths, Document};
use crate::patch::{markers, registry, PathAddress};
use crate::system;
use crate::target::{CopyTarget, DocumentTarget, EnvTarget, KnownSystem};
use crate::unit::UnitDescriptor;

/// Reverts directives for one unit.
pub struct Revert<'a> {
    unit: &'a UnitDescriptor,
    store: &'a mut FileStore,
    report: &'a mut Report,
    /// Files whose group for this unit was already removed
    removed_groups: HashSet<PathBuf>,
}

impl<'a> Revert<'a> {
    pub fn new(unit: &'a UnitDescriptor, store: &'a mut FileStore, report: &'a mut Report) -> Self {
        Self {
            unit,
            store,
            report,
            removed_groups: HashSet::new(),
        }
    }

    fn remove_group(&mut self, file: PathBuf) -> Result<()> {
        if self.removed_groups.contains(&file) {
            debug!("Group already removed from {}", file.display());
            return Ok(());
        }
        let content = markers::remove_group(&self.store.load(&file)?, self.unit.namespace())?;
        self.store.store_pending(&file, content);
        self.removed_groups.insert(file);
        Ok(())
    }

    fn try_copy(&mut self, target: CopyTarget, file: &str) -> Result<()> {
        system::validate(self.unit, target.system())?;
        let target_dir = self.store.project_path(self.unit, target.dir())?;
        let destination = copied_destination(self.store, file, &target_dir)?;
        self.store.schedule_removal(&destination);
        Ok(())
    }

    fn try_document_add(&mut self, target: DocumentTarget, path: &str) -> Result<()> {
        let path = PathAddress::parse(path)?;
        check_allowed_paths(target, &path)?;
        system::validate(self.unit, target.system())?;
        if !target.is_removable() {
            return Err(Error::policy(format!(
                "removing values from {} is not allowed",
                target.file()
            )));
        }

        let file = self.store.resolve_in_project(self.unit, target.file(), false)?;
        let mut document = Document::parse(target.format(), &self.store.load(&file)?)?;
        document.remove(&path)?;
        self.store.store_pending(&file, document.render()?);
        Ok(())
    }

    fn try_ignore_add(&mut self) -> Result<()> {
        system::validate(self.unit, Some(KnownSystem::Git))?;
        let file = self.store.resolve_in_project(self.unit, IGNORE_FILE, false)?;
        self.remove_group(file)
    }

    fn try_env_add(&mut self, target: EnvTarget) -> Result<()> {
        system::validate(self.unit, target.system())?;
        let file = self.store.project_path(self.unit, target.file())?;
        if !self.store.exists(&file) {
            info!("    No {} file found, skipping", target.file());
            return Ok(());
        }
        self.remove_group(file.clone())?;
        if self.store.load(&file)?.is_empty() {
            info!("    {} is now empty, removing it", target.file());
            self.store.schedule_removal(&file);
        }
        Ok(())
    }

    fn try_registry_add(&mut self, name: &str) -> Result<()> {
        system::validate(self.unit, Some(KnownSystem::Symfony))?;
        let file = self.store.resolve_in_project(self.unit, REGISTRY_FILE, false)?;
        let content = registry::remove_entry(&self.store.load(&file)?, name)?;
        self.store.store_pending(&file, content);
        Ok(())
    }

    fn try_settings_add(&mut self) -> Result<()> {
        system::validate(self.unit, Some(KnownSystem::Symfony))?;
        self.store.resolve_in_project(self.unit, SERVICES_FILE, false)?;
        Err(Error::NotImplemented {
            feature: format!("removing service records from {}", SERVICES_FILE),
        })
    }
}

impl PatchContext for Revert<'_> {
    fn unit(&self) -> &UnitDescriptor {
        self.unit
    }

    fn copy(&mut self, target: CopyTarget, file: &str, options: CopyOptions) {
        info!("  - remove {} from {}", file, target.dir());
        if options.ignore {
            self.ignore_add(&[]);
        }
        let result = self.try_copy(target, file);
        self.report.finish(self.unit, "copy", result);
    }

    fn document_add(&mut self, target: DocumentTarget, path: &str, _value: JsonValue, _overwrite: bool) {
        info!("  - remove value from {} at path {}", target.file(), path);
        let result = self.try_document_add(target, path);
        self.report.finish(self.unit, "document_add", result);
    }

    fn ignore_add(&mut self, _entries: &[String]) {
        info!("  - remove {} group from {}", self.unit.namespace(), IGNORE_FILE);
        let result = self.try_ignore_add();
        self.report.finish(self.unit, "ignore_add", result);
    }

    fn env_add(&mut self, target: EnvTarget, _entries: &[(String, String)], _overwrite: bool) {
        info!("  - remove {} group from {}", self.unit.namespace(), target.file());
        let result = self.try_env_add(target);
        self.report.finish(self.unit, "env_add", result);
    }

    fn registry_add(&mut self, name: &str) {
        info!("  - remove {} from {}", name, REGISTRY_FILE);
        let result = self.try_registry_add(name);
        self.report.finish(self.unit, "registry_add", result);
    }

    fn settings_add(&mut self, service: &str, _arguments: &Map<String, JsonValue>) {
        info!("  - remove service {} from {}", service, SERVICES_FILE);
        let result = self.try_settings_add();
        self.report.finish(self.unit, "settings_add", result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::{all_systems, project, read, write};
    use crate::context::Apply;
    use serde_json::json;

    fn routine(ctx: &mut dyn PatchContext) {
        ctx.copy(
            CopyTarget::CopycatConfig,
            "resources/acme_cache.yaml",
            CopyOptions {
                ignore: true,
                create_target_dir: true,
                ..CopyOptions::default()
            },
        );
        ctx.ignore_add(&["var/acme/".to_string()]);
        ctx.document_add(DocumentTarget::ComposerJson, "extra.acme", json!({"ttl": 300}), false);
        ctx.env_add(EnvTarget::Local, &[("ACME_TTL".to_string(), "300".to_string())], false);
        ctx.registry_add("Acme\\Cache\\AcmeCacheBundle");
    }

    fn apply(unit: &UnitDescriptor) -> Report {
        let mut store = FileStore::new();
        let mut report = Report::new();
        routine(&mut Apply::new(unit, &mut store, &mut report));
        store.flush_all().unwrap();
        report
    }

    fn revert(unit: &UnitDescriptor) -> Report {
        let mut store = FileStore::new();
        let mut report = Report::new();
        routine(&mut Revert::new(unit, &mut store, &mut report));
        store.flush_all().unwrap();
        report
    }

    #[test]
    fn test_revert_restores_project() {
        let (_temp, unit) = project();
        let root = unit.project_root().to_path_buf();
        all_systems(&root);
        write(&root, ".gitignore", "/vendor/\n");
        let composer_before = read(&root, "composer.json");
        let bundles_before = read(&root, "config/bundles.php");

        let report = apply(&unit);
        assert_eq!(report.failed(), 0, "{:?}", report.failures);
        assert!(root.join(".copycat/acme_cache.yaml").is_file());

        let report = revert(&unit);
        assert_eq!(report.failed(), 0, "{:?}", report.failures);

        assert!(!root.join(".copycat/acme_cache.yaml").exists());
        assert_eq!(read(&root, ".gitignore"), "/vendor/\n");
        assert!(!root.join(".env.local").exists());
        assert_eq!(read(&root, "config/bundles.php"), bundles_before);
        // the emptied parent map stays behind
        assert_eq!(
            read(&root, "composer.json"),
            composer_before.replace("\n}", ",\n    \"extra\": {}\n}")
        );
    }

    #[test]
    fn test_revert_env_keeps_file_with_other_entries() {
        let (_temp, unit) = project();
        let root = unit.project_root().to_path_buf();
        write(&root, ".env.local", "APP_SECRET=abc\n");
        let entries = [("ACME_TTL".to_string(), "300".to_string())];

        let mut store = FileStore::new();
        let mut report = Report::new();
        Apply::new(&unit, &mut store, &mut report).env_add(EnvTarget::Local, &entries, false);
        store.flush_all().unwrap();
        Revert::new(&unit, &mut store, &mut report).env_add(EnvTarget::Local, &entries, false);
        store.flush_all().unwrap();

        assert_eq!(report.failed(), 0, "{:?}", report.failures);
        assert_eq!(read(&root, ".env.local"), "APP_SECRET=abc\n");
    }

    #[test]
    fn test_revert_env_without_file_is_skipped() {
        let (_temp, unit) = project();
        let mut store = FileStore::new();
        let mut report = Report::new();
        Revert::new(&unit, &mut store, &mut report).env_add(EnvTarget::Test, &[], false);
        assert_eq!(report.failed(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_revert_missing_group_is_not_found() {
        let (_temp, unit) = project();
        let root = unit.project_root().to_path_buf();
        all_systems(&root);
        write(&root, ".gitignore", "/vendor/\n");

        let mut store = FileStore::new();
        let mut report = Report::new();
        Revert::new(&unit, &mut store, &mut report).ignore_add(&[]);
        assert_eq!(report.failed(), 1);
        assert!(report.failures[0].message.contains("Not found"));
    }

    #[test]
    fn test_revert_document_on_fixed_target_is_policy_violation() {
        let (_temp, unit) = project();
        let root = unit.project_root().to_path_buf();
        all_systems(&root);
        write(&root, ".ddev/config.yaml", "hooks: {}\n");

        let mut store = FileStore::new();
        let mut report = Report::new();
        Revert::new(&unit, &mut store, &mut report).document_add(
            DocumentTarget::DdevConfig,
            "hooks.post-start",
            JsonValue::Null,
            false,
        );
        assert_eq!(report.failed(), 1);
        assert!(report.failures[0].message.contains("Policy violation"));
    }

    #[test]
    fn test_revert_settings_is_not_implemented() {
        let (_temp, unit) = project();
        all_systems(unit.project_root());

        let mut store = FileStore::new();
        let mut report = Report::new();
        Revert::new(&unit, &mut store, &mut report).settings_add("Acme\\Cache\\Warmer", &Map::new());
        assert_eq!(report.failed(), 1);
        assert!(report.failures[0].message.contains("not implemented"));
    }
}
