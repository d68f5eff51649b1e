// menusync-core/src/catalog/listing.rs
//! Versioned text form of the available-applications listing.
use menusync_common::error::{MenuError, Result};
use menusync_common::model::LauncherDescriptor;
use tracing::warn;

use crate::context::MenuContext;
use crate::resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    /// `<id> - <name>`, or `<id>|<name>|<field>...` when fields are selected.
    V1,
}

impl ListingFormat {
    pub const LATEST: ListingFormat = ListingFormat::V1;

    /// `None` picks the latest format.
    pub fn from_version(version: Option<u32>) -> Result<Self> {
        match version {
            None | Some(1) => Ok(ListingFormat::V1),
            Some(other) => Err(MenuError::UnstableFormat(format!(
                "listing format version {other} is not supported (known: 1)"
            ))),
        }
    }

    pub fn version(self) -> u32 {
        match self {
            ListingFormat::V1 => 1,
        }
    }

    pub fn render(self, descriptor: &LauncherDescriptor, selectors: &[String]) -> String {
        match self {
            ListingFormat::V1 if selectors.is_empty() => descriptor.name_pair(),
            ListingFormat::V1 => descriptor.delimited(selectors),
        }
    }
}

/// Lines describing what `vm` offers. `template` lists entries as if `vm`
/// were based on that template instead of its own.
pub fn list_available(
    ctx: &MenuContext,
    vm: &str,
    template: Option<&str>,
    selectors: &[String],
    format: ListingFormat,
) -> Result<Vec<String>> {
    let info = ctx.inventory.require(vm)?;
    let template = match template {
        Some(name) => {
            let t = ctx.inventory.require(name)?;
            if !t.is_template() {
                return Err(MenuError::NotATemplate(name.to_string()));
            }
            Some(t)
        }
        None => resolver::template_of(&ctx.inventory, info)?,
    };
    let mut lines = Vec::new();
    for entry in ctx.catalog.discover(info, template, selectors)? {
        match entry {
            Ok(descriptor) => lines.push(format.render(&descriptor, selectors)),
            Err(e) => warn!("Skipping {}", e),
        }
    }
    Ok(lines)
}
