// menusync-core/src/sync/mod.rs
//! Brings a VM's launcher artifacts in line with its effective set.

mod dispvm;
pub mod materialize;

use std::collections::HashSet;
use std::path::PathBuf;

use menusync_common::config::{Config, LAUNCHER_PREFIX};
use menusync_common::error::Result;
use menusync_common::model::{ArtifactManifest, LauncherDescriptor, VmInfo};
use menusync_common::report::SyncReport;
use tracing::{debug, info, instrument, warn};

use crate::context::MenuContext;
use crate::{desktop, refresh, resolver};

/// Options for one synchronize run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Regenerate every artifact even when its fingerprint is current.
    pub force: bool,
}

pub(crate) fn load_manifest(config: &Config, vm: &str) -> Result<ArtifactManifest> {
    Ok(menusync_aio::read_json_optional::<ArtifactManifest>(&config.manifest_path(vm))?
        .unwrap_or_else(|| ArtifactManifest::new(vm)))
}

pub(crate) fn save_manifest(config: &Config, manifest: &ArtifactManifest) -> Result<()> {
    menusync_aio::write_json_atomic(&config.manifest_path(&manifest.vm), manifest)
}

/// Synchronizes `vm` and runs the menu refresh hook if anything changed.
///
/// Per-identifier failures are collected in the report; use
/// [`SyncReport::into_result`] to turn them into an error.
pub fn synchronize(ctx: &MenuContext, vm: &str, options: SyncOptions) -> Result<SyncReport> {
    let report = synchronize_locked(ctx, vm, options)?;
    if report.changed() {
        refresh::refresh_menus(&ctx.config);
    }
    Ok(report)
}

/// Synchronize without the refresh hook; the lock is held for the duration.
#[instrument(skip(ctx), fields(force = options.force))]
pub(crate) fn synchronize_locked(
    ctx: &MenuContext,
    vm: &str,
    options: SyncOptions,
) -> Result<SyncReport> {
    let info = ctx.inventory.require(vm)?;
    let template = resolver::template_of(&ctx.inventory, info)?;
    let _lock = ctx.lock(vm)?;

    let snapshot = ctx.catalog.snapshot(info, template, &[])?;
    let effective = resolver::compute_effective_from(ctx, info, template, &snapshot)?;
    debug!(
        "[{}] {} launchers wanted ({})",
        vm,
        effective.ids.len(),
        effective.origin
    );

    let config = &ctx.config;
    let mut manifest = load_manifest(config, vm)?;
    manifest.vm = vm.to_string();
    let mut report = SyncReport::new(vm);

    report.menu_entries_changed = write_menu_entries(config, info)?;

    // Whitelisted identifiers the VM no longer offers drop out here and
    // their records are pruned below; unreadable ones keep their artifact.
    let mut wanted: HashSet<&str> = HashSet::new();
    let mut offered: Vec<&LauncherDescriptor> = Vec::new();
    for id in &effective.ids {
        let descriptor = match snapshot.get(id) {
            Some(Ok(d)) => d,
            Some(Err(e)) => {
                warn!("[{}] cannot read {}: {}", vm, id, e);
                wanted.insert(id.as_str());
                report.failed.push((id.clone(), e.to_string()));
                continue;
            }
            None => {
                if manifest.get(id).is_some() {
                    info!("[{}] {} is no longer offered, dropping its launcher", vm, id);
                } else {
                    debug!("[{}] {} is whitelisted but not offered", vm, id);
                }
                continue;
            }
        };
        wanted.insert(id.as_str());
        offered.push(descriptor);

        let expected = materialize::artifact_fingerprint(info, descriptor);
        let existing = manifest.get(id).cloned();
        if let Some(record) = &existing {
            if !options.force && materialize::is_fresh(config, info, record, &expected) {
                report.unchanged.push(id.clone());
                continue;
            }
        }

        match materialize::materialize(config, info, descriptor) {
            Ok(record) => {
                manifest.upsert(record);
                save_manifest(config, &manifest)?;
                if existing.is_some() {
                    debug!("[{}] updated {}", vm, id);
                    report.updated.push(id.clone());
                } else {
                    debug!("[{}] created {}", vm, id);
                    report.created.push(id.clone());
                }
            }
            Err(e) => {
                warn!("[{}] failed to materialise {}: {}", vm, id, e);
                report.failed.push((id.clone(), e.to_string()));
            }
        }
    }

    let stale: Vec<String> = manifest
        .ids()
        .filter(|id| !wanted.contains(id))
        .map(str::to_string)
        .collect();
    for id in stale {
        match prune_record(config, &mut manifest, &id) {
            Ok(()) => {
                save_manifest(config, &manifest)?;
                debug!("[{}] removed {}", vm, id);
                report.removed.push(id);
            }
            Err(e) => {
                warn!("[{}] failed to remove {}: {}", vm, id, e);
                report.failed.push((id, e.to_string()));
            }
        }
    }

    sweep_untracked(config, &manifest)?;
    if dispvm::sync_dispvm_menu(config, info, &offered)? {
        report.menu_entries_changed = true;
    }

    info!("[{}] {}", vm, report.summary());
    Ok(report)
}

/// Folder entry and settings launcher; neither is counted nor pruned.
fn write_menu_entries(config: &Config, vm: &VmInfo) -> Result<bool> {
    let vm_dir = config.vm_dir(&vm.name);
    let mut changed = false;
    let directory = desktop::render_directory_entry(vm, &vm_dir);
    if menusync_aio::write_if_changed(&config.directory_entry_path(&vm.name), directory.as_bytes())? {
        debug!("[{}] wrote menu directory entry", vm.name);
        changed = true;
    }
    let settings = desktop::render_settings_entry(vm, &vm_dir);
    if menusync_aio::write_if_changed(&config.settings_entry_path(&vm.name), settings.as_bytes())? {
        debug!("[{}] wrote settings launcher", vm.name);
        changed = true;
    }
    Ok(changed)
}

fn prune_record(config: &Config, manifest: &mut ArtifactManifest, id: &str) -> Result<()> {
    let Some(record) = manifest.get(id) else {
        return Ok(());
    };
    let mut paths: Vec<PathBuf> = record.paths().cloned().collect();
    paths.push(config.launcher_path(&manifest.vm, id));
    paths.push(config.icon_path(&manifest.vm, id));
    for path in &paths {
        menusync_aio::remove_file_if_exists(path)?;
    }
    manifest.remove(id);
    Ok(())
}

/// Deletes launcher and icon files that no record accounts for.
fn sweep_untracked(config: &Config, manifest: &ArtifactManifest) -> Result<()> {
    let tracked: HashSet<PathBuf> = manifest
        .records
        .values()
        .flat_map(|r| r.paths().cloned())
        .collect();
    let launcher_prefix = format!("{LAUNCHER_PREFIX}.{}.", manifest.vm);

    let launchers = config.launchers_dir(&manifest.vm);
    for name in menusync_aio::list_file_names(&launchers)? {
        let path = launchers.join(&name);
        if name.starts_with(&launcher_prefix) && !tracked.contains(&path) {
            info!("[{}] deleting untracked launcher {}", manifest.vm, name);
            menusync_aio::remove_file_if_exists(&path)?;
        }
    }
    let icons = config.icons_dir(&manifest.vm);
    for name in menusync_aio::list_file_names(&icons)? {
        let path = icons.join(&name);
        if !tracked.contains(&path) {
            info!("[{}] deleting untracked icon {}", manifest.vm, name);
            menusync_aio::remove_file_if_exists(&path)?;
        }
    }
    Ok(())
}
