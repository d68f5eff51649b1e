// menusync-core/src/resolver.rs
//! Computes which launchers a VM should expose.
//!
//! Explicit whitelist wins, then the template's default whitelist, then the
//! whole catalog in reported order. Template references are one level deep.
use std::fmt;

use menusync_common::error::{MenuError, Result};
use menusync_common::model::{Inventory, VmInfo, VmKind, Whitelist};
use tracing::debug;

use crate::catalog::CatalogSnapshot;
use crate::context::MenuContext;
use crate::whitelist::read_list;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitelistOrigin {
    Explicit,
    TemplateDefault(String),
    Catalog,
}

impl fmt::Display for WhitelistOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhitelistOrigin::Explicit => f.write_str("explicit whitelist"),
            WhitelistOrigin::TemplateDefault(t) => write!(f, "default whitelist of '{t}'"),
            WhitelistOrigin::Catalog => f.write_str("full catalog"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSet {
    pub vm: String,
    pub origin: WhitelistOrigin,
    pub ids: Vec<String>,
}

impl EffectiveSet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }
}

fn invalid(vm: &VmInfo, reason: impl Into<String>) -> MenuError {
    MenuError::InvalidTemplateReference {
        vm: vm.name.clone(),
        reason: reason.into(),
    }
}

/// Resolves `vm`'s template reference against the inventory.
pub fn template_of<'a>(inventory: &'a Inventory, vm: &VmInfo) -> Result<Option<&'a VmInfo>> {
    let Some(name) = vm.template.as_deref() else {
        return Ok(None);
    };
    if vm.kind != VmKind::AppVM {
        return Err(invalid(vm, format!("a {} cannot be based on a template", vm.kind)));
    }
    if name == vm.name {
        return Err(invalid(vm, "VM references itself as template"));
    }
    let template = inventory
        .get(name)
        .ok_or_else(|| invalid(vm, format!("template '{name}' does not exist")))?;
    if !template.is_template() {
        return Err(invalid(
            vm,
            format!("'{name}' is a {}, not a TemplateVM", template.kind),
        ));
    }
    if template.template.is_some() {
        return Err(invalid(
            vm,
            format!("template '{name}' is itself based on a template; templates do not chain"),
        ));
    }
    Ok(Some(template))
}

/// The stored list that governs `vm`, or `None` if the catalog does.
fn stored_whitelist(
    ctx: &MenuContext,
    vm: &VmInfo,
    template: Option<&VmInfo>,
) -> Result<Option<(WhitelistOrigin, Whitelist)>> {
    if let Some(list) = read_list(&ctx.config.whitelist_path(&vm.name))? {
        return Ok(Some((WhitelistOrigin::Explicit, list)));
    }
    if let Some(t) = template {
        if let Some(list) = read_list(&ctx.config.default_whitelist_path(&t.name))? {
            return Ok(Some((WhitelistOrigin::TemplateDefault(t.name.clone()), list)));
        }
    }
    Ok(None)
}

fn from_stored(vm: &VmInfo, (origin, list): (WhitelistOrigin, Whitelist)) -> EffectiveSet {
    debug!("[{}] effective set from {}", vm.name, origin);
    EffectiveSet {
        vm: vm.name.clone(),
        origin,
        ids: list.into_vec(),
    }
}

fn from_catalog(vm: &VmInfo, snapshot: &CatalogSnapshot) -> EffectiveSet {
    debug!("[{}] effective set from full catalog", vm.name);
    EffectiveSet {
        vm: vm.name.clone(),
        origin: WhitelistOrigin::Catalog,
        ids: snapshot.ids().to_vec(),
    }
}

/// Effective set for `vm`. Queries the VM only when no stored list applies.
pub fn compute_effective(ctx: &MenuContext, vm: &str) -> Result<EffectiveSet> {
    let info = ctx.inventory.require(vm)?;
    let template = template_of(&ctx.inventory, info)?;
    match stored_whitelist(ctx, info, template)? {
        Some(stored) => Ok(from_stored(info, stored)),
        None => {
            let snapshot = ctx.catalog.snapshot(info, template, &[])?;
            Ok(from_catalog(info, &snapshot))
        }
    }
}

/// Effective set for `vm` given an already drained catalog.
pub fn compute_effective_from(
    ctx: &MenuContext,
    vm: &VmInfo,
    template: Option<&VmInfo>,
    snapshot: &CatalogSnapshot,
) -> Result<EffectiveSet> {
    Ok(match stored_whitelist(ctx, vm, template)? {
        Some(stored) => from_stored(vm, stored),
        None => from_catalog(vm, snapshot),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Inventory {
        Inventory::new(vec![
            VmInfo::new("fedora", VmKind::TemplateVM),
            VmInfo::new("bad-tpl", VmKind::TemplateVM).with_template("fedora"),
            VmInfo::new("work", VmKind::AppVM).with_template("fedora"),
            VmInfo::new("loop", VmKind::AppVM).with_template("loop"),
            VmInfo::new("on-app", VmKind::AppVM).with_template("work"),
            VmInfo::new("chained", VmKind::AppVM).with_template("bad-tpl"),
            VmInfo::new("orphan", VmKind::AppVM).with_template("gone"),
            VmInfo::new("solo", VmKind::StandaloneVM),
        ])
        .unwrap()
    }

    #[test]
    fn resolves_valid_template() {
        let inv = inventory();
        let work = inv.get("work").unwrap();
        assert_eq!(template_of(&inv, work).unwrap().unwrap().name, "fedora");
        assert!(template_of(&inv, inv.get("solo").unwrap()).unwrap().is_none());
    }

    #[test]
    fn rejects_bad_references() {
        let inv = inventory();
        for name in ["loop", "on-app", "chained", "orphan", "bad-tpl"] {
            let err = template_of(&inv, inv.get(name).unwrap()).unwrap_err();
            assert!(
                matches!(err, MenuError::InvalidTemplateReference { ref vm, .. } if vm == name),
                "{name}: {err}"
            );
        }
    }
}
