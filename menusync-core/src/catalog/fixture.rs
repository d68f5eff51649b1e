// menusync-core/src/catalog/fixture.rs
//! In-memory discovery, scripted per VM. Used by tests and dry runs.
use std::collections::HashMap;
use std::sync::Mutex;

use menusync_common::error::{MenuError, Result};
use menusync_common::model::VmInfo;

use super::{DiscoveryCapability, DiscoveryOutcome, RawEntry, CAPABILITY_VERSION};

/// VMs without a script are unreachable.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    vms: Mutex<HashMap<String, Option<Vec<RawEntry>>>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reachable(&self, vm: &str, entries: Vec<RawEntry>) {
        if let Ok(mut vms) = self.vms.lock() {
            vms.insert(vm.to_string(), Some(entries));
        }
    }

    pub fn set_unreachable(&self, vm: &str) {
        if let Ok(mut vms) = self.vms.lock() {
            vms.insert(vm.to_string(), None);
        }
    }
}

impl DiscoveryCapability for StaticDiscovery {
    fn version(&self) -> u32 {
        CAPABILITY_VERSION
    }

    fn name(&self) -> &'static str {
        "static"
    }

    fn query(&self, vm: &VmInfo, _template: Option<&VmInfo>) -> Result<DiscoveryOutcome> {
        let vms = self
            .vms
            .lock()
            .map_err(|_| MenuError::Generic("static discovery state poisoned".to_string()))?;
        Ok(match vms.get(&vm.name) {
            Some(Some(entries)) => DiscoveryOutcome::Reachable(entries.clone()),
            Some(None) => DiscoveryOutcome::Unreachable(format!("{} is not running", vm.name)),
            None => DiscoveryOutcome::Unreachable(format!("nothing scripted for {}", vm.name)),
        })
    }
}
