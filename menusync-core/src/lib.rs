// menusync-core/src/lib.rs
//! Reconciliation engine: decides which launchers each VM exposes and keeps
//! the files on disk matching that decision.

pub mod catalog;
pub mod context;
pub mod desktop;
pub mod init;
pub mod propagate;
pub mod refresh;
pub mod remove;
pub mod resolver;
pub mod sync;
pub mod whitelist;

pub use catalog::listing::{list_available, ListingFormat};
pub use catalog::{CatalogAdapter, DiscoveryCapability, DiscoveryOutcome, RawEntry, StaticDiscovery};
pub use context::MenuContext;
pub use init::{init, InitOptions, InitReport};
pub use propagate::{update, update_with_cascade, UpdateOutcome};
pub use remove::{list_storage_vms, remove, RemovalReport};
pub use resolver::{compute_effective, EffectiveSet, WhitelistOrigin};
pub use sync::{synchronize, SyncOptions};
pub use whitelist::{read_list_input, WhitelistStore, WhitelistUpdate};
