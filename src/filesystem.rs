//! Transactional file buffer for a single patch run
//!
//! Every read and write a directive performs goes through a [`FileStore`].
//! The first read of a path caches its disk content; later reads and writes
//! act on the cached copy only. Nothing touches disk again until
//! [`FileStore::flush_all`] writes all pending entries once, in the order they
//! were first touched.
//!
//! The store also resolves logical file names to absolute paths, refusing
//! anything that leaves the directory a unit is allowed to read from or write
//! into.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::defaults::VENDOR_DIR;
use crate::error::{Error, Result};
use crate::path::{canonical_or_normalized, is_within, normalize};
use crate::unit::UnitDescriptor;

/// A buffered file: what was on disk when first read and what should be
/// there after the flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedFile {
    /// Content on disk at first access, `None` if the file did not exist
    pub original: Option<Vec<u8>>,
    /// Content to write at flush, `None` to delete the file
    pub pending: Option<Vec<u8>>,
    /// Unix permission bits to apply when writing
    pub permissions: Option<u32>,
    /// Permission bits on disk at first access
    pub original_permissions: Option<u32>,
}

impl BufferedFile {
    fn from_disk(path: &Path, content: Vec<u8>) -> Self {
        Self {
            original: Some(content.clone()),
            pending: Some(content),
            permissions: None,
            original_permissions: disk_permissions(path),
        }
    }

    fn created(content: Vec<u8>) -> Self {
        Self {
            original: None,
            pending: Some(content),
            permissions: None,
            original_permissions: None,
        }
    }

    /// Whether flushing this entry would change anything on disk.
    pub fn is_modified(&self) -> bool {
        self.original != self.pending
            || (self.permissions.is_some() && self.permissions != self.original_permissions)
    }
}

/// Counts reported by [`FileStore::flush_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub written: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// In-memory staging area for all file modifications of one run.
#[derive(Debug, Default)]
pub struct FileStore {
    /// Paths in first-touch order
    order: Vec<PathBuf>,
    files: HashMap<PathBuf, BufferedFile>,
}

impl FileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a file shipped by a unit.
    ///
    /// Candidates are tried in order: `name` as given, `unit_root/name`,
    /// `source_dir/name`. The first existing regular file wins. With
    /// `enforce_scope` the result must lie inside the unit root.
    pub fn resolve_in_unit(
        &self,
        unit: &UnitDescriptor,
        name: &str,
        enforce_scope: bool,
    ) -> Result<PathBuf> {
        let candidates = [
            PathBuf::from(name),
            unit.unit_root().join(name),
            unit.source_dir().join(name),
        ];

        let resolved = candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .map(|candidate| fs::canonicalize(candidate))
            .transpose()?
            .ok_or_else(|| Error::not_found(format!("file '{}' in {}", name, unit)))?;

        if enforce_scope {
            let scope = canonical_or_normalized(unit.unit_root());
            if !resolved.starts_with(&scope) {
                let message = format!("outside of unit root {}", scope.display());
                return Err(Error::scope(resolved, message));
            }
        }

        Ok(resolved)
    }

    /// Resolve a file in the host project.
    ///
    /// The path must stay inside the project root and outside its dependency
    /// directory. A missing file is accepted if it is already buffered; with
    /// `create_if_missing` an empty entry is buffered and created at flush.
    pub fn resolve_in_project(
        &mut self,
        unit: &UnitDescriptor,
        name: &str,
        create_if_missing: bool,
    ) -> Result<PathBuf> {
        let root = canonical_or_normalized(unit.project_root());
        let mut resolved = self.project_path(unit, name)?;

        if resolved.exists() {
            resolved = fs::canonicalize(&resolved)?;
            check_project_scope(&resolved, &root)?;
            if !resolved.is_file() {
                return Err(Error::not_found(format!(
                    "project file '{}' (not a regular file)",
                    name
                )));
            }
            return Ok(resolved);
        }

        if self.exists(&resolved) {
            return Ok(resolved);
        }

        if create_if_missing {
            debug!("Creating empty file in buffer: {}", resolved.display());
            self.insert(resolved.clone(), BufferedFile::created(Vec::new()));
            return Ok(resolved);
        }

        Err(Error::not_found(format!("project file '{}'", name)))
    }

    /// Scope-checked path of `name` in the project, whether or not it exists.
    pub fn project_path(&self, unit: &UnitDescriptor, name: &str) -> Result<PathBuf> {
        let root = canonical_or_normalized(unit.project_root());
        let resolved = normalize(&root.join(name));
        check_project_scope(&resolved, &root)?;
        Ok(resolved)
    }

    /// Load a file as text, reading it from disk on first access only.
    pub fn load(&mut self, path: &Path) -> Result<String> {
        if !self.files.contains_key(path) {
            if !path.is_file() {
                return Err(Error::not_found(format!("file {}", path.display())));
            }
            debug!("Loading file: {}", path.display());
            let content = fs::read(path)?;
            self.insert(path.to_path_buf(), BufferedFile::from_disk(path, content));
        }

        match self.files.get(path).and_then(|file| file.pending.as_ref()) {
            Some(bytes) => String::from_utf8(bytes.clone()).map_err(|_| {
                Error::format(path.display().to_string(), "file content is not valid UTF-8")
            }),
            None => Err(Error::not_found(format!(
                "file {} (scheduled for removal)",
                path.display()
            ))),
        }
    }

    /// Replace the pending text of a path. Disk is not touched.
    pub fn store_pending(&mut self, path: &Path, content: impl Into<String>) {
        self.store_bytes(path, content.into().into_bytes(), None);
    }

    /// Replace the pending bytes of a path, optionally with permissions.
    pub fn store_bytes(&mut self, path: &Path, content: Vec<u8>, permissions: Option<u32>) {
        debug!("Storing modifications for: {}", path.display());
        let entry = self.entry(path);
        entry.pending = Some(content);
        if permissions.is_some() {
            entry.permissions = permissions;
        }
    }

    /// Schedule a file for deletion at flush.
    pub fn schedule_removal(&mut self, path: &Path) {
        debug!("Scheduling removal of: {}", path.display());
        let entry = self.entry(path);
        entry.pending = None;
        entry.permissions = None;
    }

    /// Whether a path exists once pending changes are taken into account.
    pub fn exists(&self, path: &Path) -> bool {
        match self.files.get(path) {
            Some(file) => file.pending.is_some(),
            None => path.is_file(),
        }
    }

    /// Get a buffered entry
    pub fn get(&self, path: &Path) -> Option<&BufferedFile> {
        self.files.get(path)
    }

    /// Buffered paths in first-touch order
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.order.iter()
    }

    /// Buffered paths whose flush would change the disk
    pub fn pending_paths(&self) -> Vec<&PathBuf> {
        self.order
            .iter()
            .filter(|path| self.files.get(*path).is_some_and(BufferedFile::is_modified))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every buffered change without writing
    pub fn discard(&mut self) {
        self.order.clear();
        self.files.clear();
    }

    /// Write every buffered entry to disk in first-touch order, then clear
    /// the buffer. Entries whose content did not change are skipped.
    pub fn flush_all(&mut self) -> Result<FlushSummary> {
        let mut summary = FlushSummary::default();

        for path in std::mem::take(&mut self.order) {
            let Some(file) = self.files.remove(&path) else {
                continue;
            };

            if !file.is_modified() {
                debug!("Unchanged, not writing: {}", path.display());
                summary.unchanged += 1;
                continue;
            }

            match file.pending {
                Some(content) => {
                    write_file(&path, &content, file.permissions)?;
                    summary.written += 1;
                }
                None => {
                    if path.exists() {
                        debug!("Removing file: {}", path.display());
                        fs::remove_file(&path)?;
                        summary.removed += 1;
                    }
                }
            }
        }

        self.files.clear();
        Ok(summary)
    }

    fn entry(&mut self, path: &Path) -> &mut BufferedFile {
        if !self.files.contains_key(path) {
            let original = fs::read(path).ok();
            let file = BufferedFile {
                pending: original.clone(),
                original,
                permissions: None,
                original_permissions: disk_permissions(path),
            };
            self.insert(path.to_path_buf(), file);
        }
        self.files
            .entry(path.to_path_buf())
            .or_insert_with(|| BufferedFile::created(Vec::new()))
    }

    fn insert(&mut self, path: PathBuf, file: BufferedFile) {
        if !self.files.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.files.insert(path, file);
    }
}

fn check_project_scope(path: &Path, root: &Path) -> Result<()> {
    if !is_within(path, root) {
        let message = format!("outside of project root {}", root.display());
        return Err(Error::scope(path, message));
    }
    let vendor = root.join(VENDOR_DIR);
    if is_within(path, &vendor) {
        let message = format!("inside the dependency directory {}", vendor.display());
        return Err(Error::scope(path, message));
    }
    Ok(())
}

#[cfg(unix)]
fn disk_permissions(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .ok()
        .map(|meta| meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn disk_permissions(_path: &Path) -> Option<u32> {
    None
}

fn write_file(path: &Path, content: &[u8], permissions: Option<u32>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    debug!("Writing file to disk: {}", path.display());
    fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = permissions {
            fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        }
    }
    #[cfg(not(unix))]
    let _ = permissions;

    Ok(())
}
