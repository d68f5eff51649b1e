// menusync-common/src/model/vm.rs
//! VM records and the inventory snapshot handed to the resolver and the
//! propagation engine.
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MenuError, Result};
use crate::model::ident;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VmKind {
    AppVM,
    TemplateVM,
    StandaloneVM,
}

impl VmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmKind::AppVM => "AppVM",
            VmKind::TemplateVM => "TemplateVM",
            VmKind::StandaloneVM => "StandaloneVM",
        }
    }

    /// Fallback menu icon when the inventory names none.
    pub fn default_icon(&self) -> &'static str {
        match self {
            VmKind::AppVM => "appvm-black",
            VmKind::TemplateVM => "templatevm-black",
            VmKind::StandaloneVM => "standalonevm-black",
        }
    }
}

impl fmt::Display for VmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmInfo {
    pub name: String,
    pub kind: VmKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Colour label, used for the disposable-launch icons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Serves as a template for disposables and wants a menu for launching them.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dispvm_menu: bool,
}

impl VmInfo {
    pub fn new(name: impl Into<String>, kind: VmKind) -> Self {
        Self {
            name: name.into(),
            kind,
            template: None,
            icon: None,
            label: None,
            dispvm_menu: false,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn is_template(&self) -> bool {
        self.kind == VmKind::TemplateVM
    }

    pub fn with_dispvm_menu(mut self) -> Self {
        self.dispvm_menu = true;
        self
    }

    pub fn icon(&self) -> &str {
        self.icon.as_deref().unwrap_or_else(|| self.kind.default_icon())
    }

    pub fn dispvm_icon(&self) -> String {
        format!("dispvm-{}", self.label.as_deref().unwrap_or("black"))
    }
}

#[derive(Debug, Default, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    vm: Vec<VmInfo>,
}

/// Snapshot of the VMs known to the host and their template relationships.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    vms: BTreeMap<String, VmInfo>,
}

impl Inventory {
    pub fn new(vms: impl IntoIterator<Item = VmInfo>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for vm in vms {
            ident::validate_vm_name(&vm.name)?;
            if map.contains_key(&vm.name) {
                return Err(MenuError::Config(format!(
                    "Duplicate VM '{}' in inventory",
                    vm.name
                )));
            }
            map.insert(vm.name.clone(), vm);
        }
        Ok(Self { vms: map })
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let file: InventoryFile = toml::from_str(raw)?;
        Self::new(file.vm)
    }

    /// Loads the inventory file; a missing file is an empty inventory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(
                "Inventory file {} not found, using an empty inventory",
                path.display()
            );
            return Ok(Self::default());
        }
        debug!("Loading inventory from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn get(&self, name: &str) -> Option<&VmInfo> {
        self.vms.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&VmInfo> {
        self.get(name)
            .ok_or_else(|| MenuError::VmNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vms.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VmInfo> {
        self.vms.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vms.keys().map(String::as_str)
    }

    /// VMs whose template reference equals `template`, ordered by name.
    pub fn dependents(&self, template: &str) -> Vec<&VmInfo> {
        self.vms
            .values()
            .filter(|vm| vm.template.as_deref() == Some(template))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.vms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vms.is_empty()
    }
}
