// menusync-core/src/context.rs
use std::sync::Arc;

use menusync_aio::VmLock;
use menusync_common::config::Config;
use menusync_common::error::Result;
use menusync_common::model::Inventory;
use tracing::debug;

use crate::catalog::CatalogAdapter;

/// Everything an operation needs: where storage lives, which VMs exist,
/// and how to ask a VM what it offers.
#[derive(Debug, Clone)]
pub struct MenuContext {
    pub config: Config,
    pub inventory: Arc<Inventory>,
    pub catalog: CatalogAdapter,
}

impl MenuContext {
    pub fn new(config: Config, inventory: Inventory, catalog: CatalogAdapter) -> Self {
        Self {
            config,
            inventory: Arc::new(inventory),
            catalog,
        }
    }

    /// Loads the inventory snapshot and picks the discovery capability from
    /// `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let inventory = Inventory::load(&config.inventory_path)?;
        debug!("Inventory has {} VMs", inventory.len());
        let catalog = CatalogAdapter::from_config(&config);
        Ok(Self::new(config, inventory, catalog))
    }

    /// Exclusive lock on `vm`'s storage, blocking until available.
    pub fn lock(&self, vm: &str) -> Result<VmLock> {
        VmLock::acquire(vm, &self.config.lock_path(vm))
    }
}
