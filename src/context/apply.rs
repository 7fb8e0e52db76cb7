//! Forward interpreter: performs each directive against the file store.

use std::path::Path;

use log::info;
use serde_json::{Map, Value as JsonValue};

use super::{service_attributes, CopyOptions, PatchContext, Report};
use crate::defaults::{IGNORE_FILE, REGISTRY_FILE, SERVICES_FILE, SERVICES_HEADER};
use crate::error::Result;
use crate::filesystem::FileStore;
use crate::patch::copy::plan_copy;
use crate::patch::document::{check_allowed_paths, Document};
use crate::patch::{markers, registry, settings, PathAddress};
use crate::system;
use crate::target::{CopyTarget, DocumentTarget, EnvTarget, KnownSystem};
use crate::unit::UnitDescriptor;

/// Applies directives for one unit.
pub struct Apply<'a> {
    unit: &'a UnitDescriptor,
    store: &'a mut FileStore,
    report: &'a mut Report,
}

impl<'a> Apply<'a> {
    pub fn new(unit: &'a UnitDescriptor, store: &'a mut FileStore, report: &'a mut Report) -> Self {
        Self {
            unit,
            store,
            report,
        }
    }

    fn try_copy(&mut self, target: CopyTarget, file: &str, options: CopyOptions) -> Result<()> {
        system::validate(self.unit, target.system())?;
        let source = self.store.resolve_in_unit(self.unit, file, true)?;
        let target_dir = self.store.project_path(self.unit, target.dir())?;
        plan_copy(
            self.store,
            &source,
            &target_dir,
            options.overwrite,
            options.create_target_dir,
        )?
        .stage(self.store);
        Ok(())
    }

    fn try_document_add(
        &mut self,
        target: DocumentTarget,
        path: &str,
        value: &JsonValue,
        overwrite: bool,
    ) -> Result<()> {
        let path = PathAddress::parse(path)?;
        check_allowed_paths(target, &path)?;
        system::validate(self.unit, target.system())?;

        let file = self.store.resolve_in_project(self.unit, target.file(), false)?;
        let mut document = Document::parse(target.format(), &self.store.load(&file)?)?;
        document.set(&path, value, overwrite)?;
        self.store.store_pending(&file, document.render()?);
        Ok(())
    }

    fn try_ignore_add(&mut self, entries: &[String]) -> Result<()> {
        system::validate(self.unit, Some(KnownSystem::Git))?;
        let file = self.store.resolve_in_project(self.unit, IGNORE_FILE, true)?;
        let (content, stats) =
            markers::add_lines(&self.store.load(&file)?, entries, self.unit.namespace())?;
        self.store.store_pending(&file, content);
        self.report.add_stats(stats);
        Ok(())
    }

    fn try_env_add(
        &mut self,
        target: EnvTarget,
        entries: &[(String, String)],
        overwrite: bool,
    ) -> Result<()> {
        system::validate(self.unit, target.system())?;
        let file = self.store.resolve_in_project(self.unit, target.file(), true)?;
        let (content, stats) = markers::add_keyed_lines(
            &self.store.load(&file)?,
            entries,
            self.unit.namespace(),
            overwrite,
        )?;
        self.store.store_pending(&file, content);
        self.report.add_stats(stats);
        Ok(())
    }

    fn try_registry_add(&mut self, name: &str) -> Result<()> {
        system::validate(self.unit, Some(KnownSystem::Symfony))?;
        let file = self.store.resolve_in_project(self.unit, REGISTRY_FILE, false)?;
        let content = registry::add_entry(&self.store.load(&file)?, name)?;
        self.store.store_pending(&file, content);
        Ok(())
    }

    fn try_settings_add(&mut self, service: &str, arguments: &Map<String, JsonValue>) -> Result<()> {
        system::validate(self.unit, Some(KnownSystem::Symfony))?;
        let file = self.store.resolve_in_project(self.unit, SERVICES_FILE, false)?;
        let attributes = service_attributes(arguments)?;
        let (content, added) =
            settings::add_block(&self.store.load(&file)?, SERVICES_HEADER, service, &attributes)?;
        if added {
            self.store.store_pending(&file, content);
        }
        Ok(())
    }
}

impl PatchContext for Apply<'_> {
    fn unit(&self) -> &UnitDescriptor {
        self.unit
    }

    fn copy(&mut self, target: CopyTarget, file: &str, options: CopyOptions) {
        info!("  - copy {} to {}", file, target.dir());
        let result = self.try_copy(target, file, options);
        let copied = result.is_ok();
        self.report.finish(self.unit, "copy", result);

        if copied && options.ignore {
            let name = Path::new(file)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.to_string());
            self.ignore_add(&[format!("{}/{}", target.dir(), name)]);
        }
    }

    fn document_add(&mut self, target: DocumentTarget, path: &str, value: JsonValue, overwrite: bool) {
        info!("  - add value to {} at path {}", target.file(), path);
        let result = self.try_document_add(target, path, &value, overwrite);
        self.report.finish(self.unit, "document_add", result);
    }

    fn ignore_add(&mut self, entries: &[String]) {
        info!("  - add {} entries to {}", entries.len(), IGNORE_FILE);
        let result = self.try_ignore_add(entries);
        self.report.finish(self.unit, "ignore_add", result);
    }

    fn env_add(&mut self, target: EnvTarget, entries: &[(String, String)], overwrite: bool) {
        info!("  - add {} entries to {}", entries.len(), target.file());
        let result = self.try_env_add(target, entries, overwrite);
        self.report.finish(self.unit, "env_add", result);
    }

    fn registry_add(&mut self, name: &str) {
        info!("  - register {} in {}", name, REGISTRY_FILE);
        let result = self.try_registry_add(name);
        self.report.finish(self.unit, "registry_add", result);
    }

    fn settings_add(&mut self, service: &str, arguments: &Map<String, JsonValue>) {
        info!("  - add service {} to {}", service, SERVICES_FILE);
        let result = self.try_settings_add(service, arguments);
        self.report.finish(self.unit, "settings_add", result);
    }
}
