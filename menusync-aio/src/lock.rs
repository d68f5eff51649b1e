// menusync-aio/src/lock.rs
//! Per-VM exclusive locks backed by `flock` on a lock file outside the VM's
//! storage root.
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs4::FileExt;
use menusync_common::error::{MenuError, Result};
use tracing::{debug, info};

/// Held exclusive lock on one VM's storage. Released on drop.
#[derive(Debug)]
pub struct VmLock {
    vm: String,
    path: PathBuf,
    file: File,
}

impl VmLock {
    /// Blocks until the lock for `vm` at `path` is held.
    pub fn acquire(vm: &str, path: &Path) -> Result<Self> {
        let file = open_lock_file(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                info!("Waiting for another operation on '{}' to finish...", vm);
                file.lock_exclusive().map_err(|e| {
                    MenuError::Lock(format!("failed to lock {}: {e}", path.display()))
                })?;
            }
            Err(e) => {
                return Err(MenuError::Lock(format!(
                    "failed to lock {}: {e}",
                    path.display()
                )))
            }
        }
        debug!("Acquired lock for '{}' at {}", vm, path.display());
        Ok(Self {
            vm: vm.to_string(),
            path: path.to_path_buf(),
            file,
        })
    }

    /// Non-blocking variant; `None` if another holder has it.
    pub fn try_acquire(vm: &str, path: &Path) -> Result<Option<Self>> {
        let file = open_lock_file(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                vm: vm.to_string(),
                path: path.to_path_buf(),
                file,
            })),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(MenuError::Lock(format!(
                "failed to lock {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn vm(&self) -> &str {
        &self.vm
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for VmLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("Released lock for '{}'", self.vm);
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        crate::fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|e| MenuError::Lock(format!("failed to open lock {}: {e}", path.display())))
}
