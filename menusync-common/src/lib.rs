// menusync-common/src/lib.rs
pub mod cascade;
pub mod config;
pub mod error;
pub mod model;
pub mod report;

// Re-export key types
pub use config::Config;
pub use error::{MenuError, Result};
pub use model::{Inventory, LauncherDescriptor, VmInfo, VmKind, Whitelist};
pub use report::{CascadeReport, ChildOutcome, SyncReport};
