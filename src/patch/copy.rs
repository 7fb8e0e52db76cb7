//! Buffered file copies
//!
//! A copy reads its source immediately and stages the bytes in the
//! [`FileStore`] under the destination path, so copied files are written at
//! flush together with every other change of the run.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::filesystem::FileStore;

/// A staged copy of one file into a target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub content: Vec<u8>,
    pub permissions: Option<u32>,
}

impl CopyPlan {
    /// Stage the copy in the store.
    pub fn stage(self, store: &mut FileStore) {
        debug!(
            "Staging copy {} -> {}",
            self.source.display(),
            self.destination.display()
        );
        store.store_bytes(&self.destination, self.content, self.permissions);
    }
}

fn file_name(source: &Path) -> Result<&std::ffi::OsStr> {
    source
        .file_name()
        .ok_or_else(|| Error::not_found(format!("file name of {}", source.display())))
}

fn check_target_dir(target_dir: &Path, create_dir: bool) -> Result<()> {
    if target_dir.is_dir() {
        return Ok(());
    }
    if target_dir.exists() {
        return Err(Error::format(
            target_dir.display().to_string(),
            "target exists but is not a directory",
        ));
    }
    if create_dir {
        debug!("Target directory will be created: {}", target_dir.display());
        return Ok(());
    }
    Err(Error::not_found(format!(
        "target directory {}",
        target_dir.display()
    )))
}

#[cfg(unix)]
fn source_permissions(source: &Path) -> Result<Option<u32>> {
    use std::os::unix::fs::PermissionsExt;
    Ok(Some(fs::metadata(source)?.permissions().mode() & 0o7777))
}

#[cfg(not(unix))]
fn source_permissions(_source: &Path) -> Result<Option<u32>> {
    Ok(None)
}

/// Plan copying `source` into `target_dir`, keeping its file name.
///
/// Without `overwrite` an existing destination (on disk or staged) is a
/// conflict. Without `create_dir` the target directory must already exist.
pub fn plan_copy(
    store: &FileStore,
    source: &Path,
    target_dir: &Path,
    overwrite: bool,
    create_dir: bool,
) -> Result<CopyPlan> {
    if !source.is_file() {
        return Err(Error::not_found(format!("source file {}", source.display())));
    }
    check_target_dir(target_dir, create_dir)?;

    let destination = target_dir.join(file_name(source)?);
    if !overwrite && store.exists(&destination) {
        return Err(Error::conflict(
            destination.display().to_string(),
            "destination file already exists",
        ));
    }

    Ok(CopyPlan {
        source: source.to_path_buf(),
        content: fs::read(source)?,
        permissions: source_permissions(source)?,
        destination,
    })
}

/// Destination that a copy of a file named like `source` produced in
/// `target_dir`. It must exist, taking staged changes into account.
pub fn copied_destination(store: &FileStore, source: &str, target_dir: &Path) -> Result<PathBuf> {
    if !target_dir.is_dir() {
        return Err(Error::not_found(format!(
            "target directory {}",
            target_dir.display()
        )));
    }

    let destination = target_dir.join(file_name(Path::new(source))?);
    if !store.exists(&destination) {
        return Err(Error::not_found(format!(
            "destination file {}",
            destination.display()
        )));
    }
    Ok(destination)
}
