// menusync-common/src/model/mod.rs
// Declares the modules within the model directory.
pub mod artifact;
pub mod ident;
pub mod launcher;
pub mod vm;
pub mod whitelist;

// Re-export
pub use artifact::{ArtifactManifest, ArtifactRecord};
pub use launcher::{DisplayFields, Fingerprint, LauncherDescriptor, SourceKind};
pub use vm::{Inventory, VmInfo, VmKind};
pub use whitelist::Whitelist;
