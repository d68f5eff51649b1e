// menusync-core/src/sync/materialize.rs
//! Writes one launcher's icon and descriptor into a VM's menu directories.
use chrono::Utc;
use menusync_aio::ContentHasher;
use menusync_common::config::Config;
use menusync_common::error::Result;
use menusync_common::model::{ArtifactRecord, Fingerprint, LauncherDescriptor, VmInfo};
use tracing::debug;

use crate::desktop;

/// Fingerprint of what would be written for `descriptor` in `vm`: the
/// source content plus the VM icon it falls back to.
pub fn artifact_fingerprint(vm: &VmInfo, descriptor: &LauncherDescriptor) -> Fingerprint {
    let mut hasher = ContentHasher::new();
    hasher.update("source", descriptor.fingerprint.as_str().as_bytes());
    if descriptor.icon.is_none() {
        hasher.update("vm-icon", vm.icon().as_bytes());
    }
    Fingerprint::new(hasher.finish_hex())
}

/// Whether `record` still describes current, present artifacts.
pub fn is_fresh(config: &Config, vm: &VmInfo, record: &ArtifactRecord, expected: &Fingerprint) -> bool {
    if record.fingerprint != *expected {
        return false;
    }
    if record.descriptor_path != config.launcher_path(&vm.name, &record.id) {
        return false;
    }
    record.paths().all(|p| p.is_file())
}

/// Icon first, then the descriptor, each via temp file and rename, so the
/// descriptor never points at an icon that is not there yet.
pub fn materialize(
    config: &Config,
    vm: &VmInfo,
    descriptor: &LauncherDescriptor,
) -> Result<ArtifactRecord> {
    let icon_dest = config.icon_path(&vm.name, &descriptor.id);
    let icon_path = match &descriptor.icon {
        Some(src) => {
            menusync_aio::atomic_copy_file(src, &icon_dest)?;
            Some(icon_dest)
        }
        None => {
            menusync_aio::remove_file_if_exists(&icon_dest)?;
            None
        }
    };

    let xdg_icon = icon_path
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| vm.icon().to_string());
    let rendered = desktop::render(
        &descriptor.template,
        &vm.name,
        &config.vm_dir(&vm.name),
        &xdg_icon,
    );
    let descriptor_path = config.launcher_path(&vm.name, &descriptor.id);
    menusync_aio::atomic_write_file(&descriptor_path, rendered.as_bytes())?;
    debug!(
        "[{}] wrote {} ({} bytes)",
        vm.name,
        descriptor_path.display(),
        rendered.len()
    );

    Ok(ArtifactRecord {
        id: descriptor.id.clone(),
        descriptor_path,
        icon_path,
        fingerprint: artifact_fingerprint(vm, descriptor),
        synced_at: Utc::now(),
    })
}
