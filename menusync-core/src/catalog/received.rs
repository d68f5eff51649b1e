// menusync-core/src/catalog/received.rs
//! Discovery from desktop templates a VM has already sent to the host.
//!
//! The VM's own `apps.templates/` is searched first, then its template's, so
//! an entry the VM sent itself shadows the inherited one.
use std::collections::HashSet;
use std::path::PathBuf;

use menusync_common::config::Config;
use menusync_common::error::Result;
use menusync_common::model::{SourceKind, VmInfo};
use tracing::{debug, trace};

use super::{DiscoveryCapability, DiscoveryOutcome, RawEntry, TemplateSource, CAPABILITY_VERSION};

#[derive(Debug, Clone)]
pub struct ReceivedTemplateDiscovery {
    config: Config,
}

impl ReceivedTemplateDiscovery {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn icon_for(&self, icon_dirs: &[PathBuf], id: &str) -> Option<PathBuf> {
        let stem = id.strip_suffix(".desktop").unwrap_or(id);
        icon_dirs
            .iter()
            .map(|dir| dir.join(format!("{stem}.png")))
            .find(|p| p.is_file())
    }
}

impl DiscoveryCapability for ReceivedTemplateDiscovery {
    fn version(&self) -> u32 {
        CAPABILITY_VERSION
    }

    fn name(&self) -> &'static str {
        "received-templates"
    }

    fn query(&self, vm: &VmInfo, template: Option<&VmInfo>) -> Result<DiscoveryOutcome> {
        let mut sources = vec![(vm.name.as_str(), SourceKind::Own)];
        if let Some(t) = template {
            sources.push((t.name.as_str(), SourceKind::Template));
        }

        let search: Vec<_> = sources
            .iter()
            .map(|(name, kind)| (self.config.templates_dir(name), *kind))
            .filter(|(dir, _)| dir.is_dir())
            .collect();
        if search.is_empty() {
            return Ok(DiscoveryOutcome::Unreachable(format!(
                "no application templates received from {}",
                vm.name
            )));
        }
        let icon_dirs: Vec<PathBuf> = sources
            .iter()
            .map(|(name, _)| self.config.template_icons_dir(name))
            .collect();

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (dir, kind) in search {
            debug!("Reading received templates from {}", dir.display());
            for file_name in menusync_aio::list_file_names(&dir)? {
                if !file_name.ends_with(".desktop") {
                    trace!("Skipping non-launcher {}", file_name);
                    continue;
                }
                if !seen.insert(file_name.clone()) {
                    trace!("{} shadowed by an earlier source", file_name);
                    continue;
                }
                entries.push(RawEntry {
                    icon: self.icon_for(&icon_dirs, &file_name),
                    template: TemplateSource::Path(dir.join(&file_name)),
                    source_kind: kind,
                    id: file_name,
                });
            }
        }
        Ok(DiscoveryOutcome::Reachable(entries))
    }
}
