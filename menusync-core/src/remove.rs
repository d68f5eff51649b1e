// menusync-core/src/remove.rs
//! Deletes a VM's storage root. The VM need not be in the inventory.
use menusync_common::config::Config;
use menusync_common::error::Result;
use menusync_common::model::ident::validate_vm_name;
use tracing::{debug, info, instrument};

use crate::context::MenuContext;
use crate::refresh;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub vm: String,
    /// `false` if there was nothing to remove.
    pub existed: bool,
    pub files_removed: usize,
    pub bytes_removed: u64,
}

#[instrument(skip(ctx))]
pub fn remove(ctx: &MenuContext, vm: &str) -> Result<RemovalReport> {
    validate_vm_name(vm)?;
    let _lock = ctx.lock(vm)?;

    let root = ctx.config.vm_dir(vm);
    let mut report = RemovalReport {
        vm: vm.to_string(),
        ..RemovalReport::default()
    };
    if !root.exists() {
        debug!("{} does not exist, nothing to remove", root.display());
        return Ok(report);
    }

    let (files, bytes) = menusync_aio::count_files_and_size(&root);
    report.existed = menusync_aio::remove_directory_recursive(&root)?;
    report.files_removed = files;
    report.bytes_removed = bytes;
    info!(
        "Removed storage for '{}' ({} files, {} bytes)",
        vm, files, bytes
    );
    refresh::refresh_menus(&ctx.config);
    Ok(report)
}

/// VMs that have a storage root under the data root, by name.
pub fn list_storage_vms(config: &Config) -> Result<Vec<String>> {
    let root = config.data_root();
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    Ok(menusync_aio::list_directory_entries(root)?
        .into_iter()
        .filter(|(name, _, is_dir)| *is_dir && validate_vm_name(name).is_ok())
        .map(|(name, _, _)| name)
        .collect())
}
