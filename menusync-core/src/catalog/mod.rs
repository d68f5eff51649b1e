// menusync-core/src/catalog/mod.rs
//! Application catalog: wraps a discovery capability and turns what it
//! reports into [`LauncherDescriptor`]s on demand.

pub mod command;
pub mod fixture;
pub mod listing;
pub mod received;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use menusync_aio::ContentHasher;
use menusync_common::config::Config;
use menusync_common::error::{MenuError, Result};
use menusync_common::model::ident::is_valid_launcher_id;
use menusync_common::model::{Fingerprint, LauncherDescriptor, SourceKind, VmInfo};
use tracing::{debug, warn};

pub use command::CommandDiscovery;
pub use fixture::StaticDiscovery;
pub use received::ReceivedTemplateDiscovery;

use crate::desktop;

/// Discovery interface version this adapter understands.
pub const CAPABILITY_VERSION: u32 = 1;

/// Where an entry's desktop template lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Path(PathBuf),
    Inline(String),
}

/// One application as reported by a discovery capability, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub id: String,
    pub template: TemplateSource,
    pub icon: Option<PathBuf>,
    pub source_kind: SourceKind,
}

impl RawEntry {
    pub fn inline(id: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            template: TemplateSource::Inline(template.into()),
            icon: None,
            source_kind: SourceKind::Own,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DiscoveryOutcome {
    Reachable(Vec<RawEntry>),
    Unreachable(String),
}

/// Something that can tell which applications a VM offers.
///
/// Implementations never trust the VM: the adapter validates identifiers and
/// parses templates itself.
pub trait DiscoveryCapability: Send + Sync + fmt::Debug {
    fn version(&self) -> u32;

    fn name(&self) -> &'static str;

    /// Queries `vm`. `template` is the VM's resolved template, if any.
    fn query(&self, vm: &VmInfo, template: Option<&VmInfo>) -> Result<DiscoveryOutcome>;
}

/// Per-entry failure while turning a raw entry into a descriptor.
#[derive(Debug, Clone)]
pub struct CatalogEntryError {
    pub id: String,
    pub error: MenuError,
}

impl fmt::Display for CatalogEntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.error)
    }
}

#[derive(Debug, Clone)]
pub struct CatalogAdapter {
    capability: Arc<dyn DiscoveryCapability>,
}

impl CatalogAdapter {
    pub fn new(capability: Arc<dyn DiscoveryCapability>) -> Self {
        Self { capability }
    }

    /// Command discovery when configured, received templates otherwise.
    pub fn from_config(config: &Config) -> Self {
        match &config.discovery_command {
            Some(cmd) => {
                debug!("Using command discovery: {}", cmd);
                Self::new(Arc::new(CommandDiscovery::new(cmd.clone())))
            }
            None => Self::new(Arc::new(ReceivedTemplateDiscovery::new(config.clone()))),
        }
    }

    pub fn capability_name(&self) -> &'static str {
        self.capability.name()
    }

    /// Queries the VM and returns a lazy sequence of descriptors carrying
    /// exactly `selectors` as display fields. Unreachable VMs are an error.
    pub fn discover(
        &self,
        vm: &VmInfo,
        template: Option<&VmInfo>,
        selectors: &[String],
    ) -> Result<Catalog> {
        let version = self.capability.version();
        if version != CAPABILITY_VERSION {
            return Err(MenuError::Discovery(format!(
                "discovery capability '{}' speaks version {}, expected {}",
                self.capability.name(),
                version,
                CAPABILITY_VERSION
            )));
        }
        match self.capability.query(vm, template)? {
            DiscoveryOutcome::Reachable(entries) => {
                debug!(
                    "[{}] {} reported {} entries",
                    vm.name,
                    self.capability.name(),
                    entries.len()
                );
                Ok(Catalog::new(entries, selectors.to_vec()))
            }
            DiscoveryOutcome::Unreachable(reason) => Err(MenuError::VmUnreachable {
                vm: vm.name.clone(),
                reason,
            }),
        }
    }

    /// Drains a fresh discovery into a snapshot.
    pub fn snapshot(
        &self,
        vm: &VmInfo,
        template: Option<&VmInfo>,
        selectors: &[String],
    ) -> Result<CatalogSnapshot> {
        Ok(CatalogSnapshot::collect(
            self.discover(vm, template, selectors)?,
        ))
    }
}

/// Lazy, single-pass sequence of descriptors from one discovery call.
pub struct Catalog {
    entries: std::vec::IntoIter<RawEntry>,
    selectors: Vec<String>,
}

impl Catalog {
    fn new(entries: Vec<RawEntry>, selectors: Vec<String>) -> Self {
        Self {
            entries: entries.into_iter(),
            selectors,
        }
    }
}

impl Iterator for Catalog {
    type Item = std::result::Result<LauncherDescriptor, CatalogEntryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = self.entries.next()?;
            if !is_valid_launcher_id(&raw.id) {
                warn!("Ignoring invalid launcher identifier '{}'", raw.id);
                continue;
            }
            let id = raw.id.clone();
            return Some(
                describe(raw, &self.selectors).map_err(|error| CatalogEntryError { id, error }),
            );
        }
    }
}

fn describe(raw: RawEntry, selectors: &[String]) -> Result<LauncherDescriptor> {
    let template = match raw.template {
        TemplateSource::Inline(s) => s,
        TemplateSource::Path(p) => menusync_aio::read_to_string(&p)?,
    };
    let parsed = desktop::parse_entry(&template, selectors);
    let name = parsed.name.ok_or_else(|| {
        MenuError::Discovery(format!("{} has no Name in its main section", raw.id))
    })?;

    let mut hasher = ContentHasher::new();
    hasher.update("template", template.as_bytes());
    if let Some(icon) = &raw.icon {
        hasher.update_file("icon", icon)?;
    }

    Ok(LauncherDescriptor {
        id: raw.id,
        name,
        fields: parsed.fields,
        fingerprint: Fingerprint::new(hasher.finish_hex()),
        source_kind: raw.source_kind,
        template,
        icon: raw.icon,
    })
}

/// A fully drained catalog: identifiers in reported order, each with its
/// descriptor or the reason it could not be built.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    order: Vec<String>,
    entries: HashMap<String, std::result::Result<LauncherDescriptor, MenuError>>,
}

impl CatalogSnapshot {
    pub fn collect(catalog: Catalog) -> Self {
        let mut snapshot = Self::default();
        for item in catalog {
            let (id, entry) = match item {
                Ok(d) => (d.id.clone(), Ok(d)),
                Err(e) => (e.id, Err(e.error)),
            };
            if snapshot.entries.contains_key(&id) {
                debug!("Duplicate catalog entry '{}' ignored", id);
                continue;
            }
            snapshot.order.push(id.clone());
            snapshot.entries.insert(id, entry);
        }
        snapshot
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&std::result::Result<LauncherDescriptor, MenuError>> {
        self.entries.get(id)
    }

    /// Successfully built descriptors, in catalog order.
    pub fn descriptors(&self) -> impl Iterator<Item = &LauncherDescriptor> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).and_then(|e| e.as_ref().ok()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
