// menusync-core/src/whitelist.rs
//! Per-VM explicit whitelists and per-template default whitelists.
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use menusync_common::error::{MenuError, Result};
use menusync_common::model::{VmInfo, Whitelist};
use tracing::{debug, info, instrument, warn};

use crate::context::MenuContext;
use crate::resolver;

/// Sentinel for "read the list from standard input".
pub const STDIN_SENTINEL: &str = "-";

/// Result of a whitelist write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistUpdate {
    pub vm: String,
    pub whitelist: Whitelist,
    /// `false` when the VM could not be queried and the list was stored
    /// without checking it against the catalog.
    pub validated: bool,
}

pub struct WhitelistStore<'a> {
    ctx: &'a MenuContext,
}

impl<'a> WhitelistStore<'a> {
    pub fn new(ctx: &'a MenuContext) -> Self {
        Self { ctx }
    }

    /// The VM's explicit whitelist, `None` when unset (inherit).
    pub fn get(&self, vm: &str) -> Result<Option<Whitelist>> {
        self.ctx.inventory.require(vm)?;
        read_list(&self.ctx.config.whitelist_path(vm))
    }

    /// The template's default whitelist, `None` when unset.
    pub fn get_default(&self, template: &str) -> Result<Option<Whitelist>> {
        self.ctx.inventory.require(template)?;
        read_list(&self.ctx.config.default_whitelist_path(template))
    }

    #[instrument(skip(self, whitelist), fields(entries = whitelist.len()))]
    pub fn set(&self, vm: &str, whitelist: Whitelist) -> Result<WhitelistUpdate> {
        let info = self.ctx.inventory.require(vm)?;
        let template = resolver::template_of(&self.ctx.inventory, info)?;
        let validated = self.validate(info, template, &whitelist)?;

        let _lock = self.ctx.lock(vm)?;
        write_list(&self.ctx.config.whitelist_path(vm), &whitelist)?;
        info!("Stored whitelist for '{}' ({} entries)", vm, whitelist.len());
        Ok(WhitelistUpdate {
            vm: vm.to_string(),
            whitelist,
            validated,
        })
    }

    #[instrument(skip(self, whitelist), fields(entries = whitelist.len()))]
    pub fn set_default(&self, template: &str, whitelist: Whitelist) -> Result<WhitelistUpdate> {
        let info = self.ctx.inventory.require(template)?;
        if !info.is_template() {
            return Err(MenuError::NotATemplate(template.to_string()));
        }
        let validated = self.validate(info, None, &whitelist)?;

        let _lock = self.ctx.lock(template)?;
        write_list(&self.ctx.config.default_whitelist_path(template), &whitelist)?;
        info!(
            "Stored default whitelist for template '{}' ({} entries)",
            template,
            whitelist.len()
        );
        Ok(WhitelistUpdate {
            vm: template.to_string(),
            whitelist,
            validated,
        })
    }

    /// Returns the VM to inheriting. `true` if an explicit list was removed.
    pub fn clear(&self, vm: &str) -> Result<bool> {
        self.ctx.inventory.require(vm)?;
        let _lock = self.ctx.lock(vm)?;
        let removed = menusync_aio::remove_file_if_exists(&self.ctx.config.whitelist_path(vm))?;
        if removed {
            info!("Cleared explicit whitelist for '{}'", vm);
        }
        Ok(removed)
    }

    pub fn clear_default(&self, template: &str) -> Result<bool> {
        let info = self.ctx.inventory.require(template)?;
        if !info.is_template() {
            return Err(MenuError::NotATemplate(template.to_string()));
        }
        let _lock = self.ctx.lock(template)?;
        menusync_aio::remove_file_if_exists(&self.ctx.config.default_whitelist_path(template))
    }

    /// Checks every id against the VM's catalog. An unreachable VM degrades
    /// to accepting the list unchecked.
    fn validate(
        &self,
        vm: &VmInfo,
        template: Option<&VmInfo>,
        whitelist: &Whitelist,
    ) -> Result<bool> {
        let snapshot = match self.ctx.catalog.snapshot(vm, template, &[]) {
            Ok(s) => s,
            Err(e) if e.is_unreachable() => {
                warn!(
                    "Could not query '{}' ({}); storing whitelist without validation",
                    vm.name, e
                );
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        let unknown: Vec<String> = whitelist
            .iter()
            .filter(|id| !snapshot.contains(id))
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(MenuError::InvalidWhitelistEntry {
                vm: vm.name.clone(),
                entries: unknown,
            });
        }
        debug!("All {} entries present in catalog of '{}'", whitelist.len(), vm.name);
        Ok(true)
    }
}

pub(crate) fn read_list(path: &Path) -> Result<Option<Whitelist>> {
    match menusync_aio::read_optional_string(path)? {
        Some(raw) => Whitelist::parse(&raw).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn write_list(path: &Path, whitelist: &Whitelist) -> Result<()> {
    menusync_aio::atomic_write_file(path, whitelist.to_lines().as_bytes())
}

/// Reads list input from a file path, or from stdin for `-`.
pub fn read_list_input(source: &str) -> Result<Whitelist> {
    let raw = if source == STDIN_SENTINEL {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| MenuError::Io(Arc::new(e)))?;
        buf
    } else {
        let path = PathBuf::from(source);
        menusync_aio::read_to_string(&path)?
    };
    Whitelist::parse(&raw)
}
