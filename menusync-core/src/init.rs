// menusync-core/src/init.rs
//! Creates a VM's storage root, optionally seeded from another VM.
use menusync_aio::VmLock;
use menusync_common::config::Config;
use menusync_common::error::{MenuError, Result};
use menusync_common::model::{ArtifactManifest, VmInfo};
use tracing::{debug, info, instrument, warn};

use crate::context::MenuContext;
use crate::sync::materialize;
use crate::sync::{load_manifest, save_manifest};
use crate::{desktop, resolver};
use crate::whitelist::{read_list, write_list};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOptions {
    /// VM to clone whitelists, records and received templates from.
    pub source: Option<String>,
    /// Wipe an existing storage root before seeding.
    pub reset: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub vm: String,
    /// `false` when the storage root already existed and nothing was done.
    pub created: bool,
    pub seeded_from: Option<String>,
    pub whitelist_seeded: bool,
    /// Source launchers rendered for the new VM during seeding.
    pub records_seeded: usize,
    pub templates_copied: usize,
}

fn lock_pair(ctx: &MenuContext, a: &str, b: &str) -> Result<(VmLock, VmLock)> {
    if a < b {
        let first = ctx.lock(a)?;
        Ok((first, ctx.lock(b)?))
    } else {
        let first = ctx.lock(b)?;
        let second = ctx.lock(a)?;
        Ok((second, first))
    }
}

/// Creates `vm`'s storage root. With a source, its whitelists and received
/// templates are copied, and every launcher the source has a record for is
/// rendered for `vm` right away when `vm` can be queried; entries it does not
/// offer, or all of them when it is unreachable, are left to the next
/// synchronize. Without a source, a VM that has no template gets the start
/// launcher template and an AppVM inherits its template's default whitelist.
#[instrument(skip(ctx))]
pub fn init(ctx: &MenuContext, vm: &str, options: &InitOptions) -> Result<InitReport> {
    let info = ctx.inventory.require(vm)?;
    let source = match options.source.as_deref() {
        Some(s) if s == vm => {
            return Err(MenuError::Generic(format!("'{vm}' cannot be seeded from itself")))
        }
        Some(s) => Some(
            ctx.inventory
                .get(s)
                .ok_or_else(|| MenuError::SourceNotFound(s.to_string()))?,
        ),
        None => None,
    };

    let _locks = match source {
        Some(src) => {
            let (a, b) = lock_pair(ctx, vm, &src.name)?;
            (a, Some(b))
        }
        None => (ctx.lock(vm)?, None),
    };

    let config = &ctx.config;
    let root = config.vm_dir(vm);
    if options.reset && menusync_aio::remove_directory_recursive(&root)? {
        info!("Reset storage for '{}'", vm);
    }

    let mut report = InitReport {
        vm: vm.to_string(),
        ..InitReport::default()
    };
    if root.is_dir() {
        debug!("{} already initialised", root.display());
        return Ok(report);
    }

    menusync_aio::create_dir_all(&config.launchers_dir(vm))?;
    menusync_aio::create_dir_all(&config.icons_dir(vm))?;
    report.created = true;

    match source {
        Some(src) => seed_from_source(ctx, info, src, &mut report)?,
        None => {
            if info.template.is_none() {
                // VMs without a template receive their own application list.
                menusync_aio::create_dir_all(&config.template_icons_dir(vm))?;
                let start = config.templates_dir(vm).join(desktop::START_ENTRY_ID);
                menusync_aio::atomic_write_file(&start, desktop::START_TEMPLATE.as_bytes())?;
                report.templates_copied = 1;
            }
            if let Some(template) = resolver::template_of(&ctx.inventory, info)? {
                report.whitelist_seeded = seed_from_template_default(config, info, template)?;
            }
        }
    }

    info!(
        "Initialised storage for '{}'{}",
        vm,
        report
            .seeded_from
            .as_deref()
            .map(|s| format!(" from '{s}'"))
            .unwrap_or_default()
    );
    Ok(report)
}

fn seed_from_template_default(config: &Config, vm: &VmInfo, template: &VmInfo) -> Result<bool> {
    if read_list(&config.whitelist_path(&vm.name))?.is_some() {
        return Ok(false);
    }
    match read_list(&config.default_whitelist_path(&template.name))? {
        Some(list) => {
            info!(
                "Seeding whitelist of '{}' from default of '{}'",
                vm.name, template.name
            );
            write_list(&config.whitelist_path(&vm.name), &list)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn seed_from_source(
    ctx: &MenuContext,
    vm: &VmInfo,
    src: &VmInfo,
    report: &mut InitReport,
) -> Result<()> {
    let config = &ctx.config;
    report.seeded_from = Some(src.name.clone());

    if let Some(list) = read_list(&config.whitelist_path(&src.name))? {
        write_list(&config.whitelist_path(&vm.name), &list)?;
        report.whitelist_seeded = true;
    }
    if vm.is_template() {
        if let Some(list) = read_list(&config.default_whitelist_path(&src.name))? {
            write_list(&config.default_whitelist_path(&vm.name), &list)?;
        }
    }

    report.templates_copied = menusync_aio::copy_dir_files(
        &config.templates_dir(&src.name),
        &config.templates_dir(&vm.name),
    )?;
    menusync_aio::copy_dir_files(
        &config.template_icons_dir(&src.name),
        &config.template_icons_dir(&vm.name),
    )?;

    let source_manifest = load_manifest(config, &src.name)?;
    if source_manifest.is_empty() {
        return Ok(());
    }
    let template = resolver::template_of(&ctx.inventory, vm)?;
    let snapshot = match ctx.catalog.snapshot(vm, template, &[]) {
        Ok(snapshot) => snapshot,
        Err(e) if e.is_unreachable() => {
            warn!(
                "'{}' cannot be queried, its {} launchers are rendered on the next sync: {}",
                vm.name,
                source_manifest.len(),
                e
            );
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let mut manifest = ArtifactManifest::new(vm.name.clone());
    for id in source_manifest.ids() {
        match snapshot.get(id) {
            Some(Ok(descriptor)) => match materialize::materialize(config, vm, descriptor) {
                Ok(record) => {
                    manifest.upsert(record);
                }
                Err(e) => warn!("[{}] could not render seeded {}: {}", vm.name, id, e),
            },
            Some(Err(e)) => warn!("[{}] cannot read seeded {}: {}", vm.name, id, e),
            None => debug!("[{}] seeded {} is not offered, skipping", vm.name, id),
        }
    }
    report.records_seeded = manifest.len();
    if !manifest.is_empty() {
        save_manifest(config, &manifest)?;
    }
    Ok(())
}
