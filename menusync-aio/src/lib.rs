// menusync-aio/src/lib.rs
//! Filesystem and process primitives for menusync (atomic writes, json,
//! checksums, locks, external commands)

pub mod checksum;
pub mod fs;
pub mod json_io;
pub mod lock;
pub mod process;

pub use checksum::{sha256_hex, ContentHasher};
pub use fs::*;
pub use json_io::{read_json_optional, write_json_atomic};
pub use lock::VmLock;
pub use process::run_command;
