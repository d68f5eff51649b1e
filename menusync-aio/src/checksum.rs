// menusync-aio/src/checksum.rs
use std::path::Path;

use menusync_common::error::Result;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Incremental SHA-256 over several labelled inputs.
///
/// Each part is length-prefixed so that moving bytes between parts changes
/// the digest.
#[derive(Default)]
pub struct ContentHasher {
    hasher: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, label: &str, bytes: &[u8]) -> &mut Self {
        self.hasher.update(label.as_bytes());
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
        self
    }

    /// Hashes the file's content under `label`.
    pub fn update_file(&mut self, label: &str, path: &Path) -> Result<&mut Self> {
        let bytes = crate::fs::read_to_bytes(path)?;
        debug!("Hashing {} ({} bytes)", path.display(), bytes.len());
        Ok(self.update(label, &bytes))
    }

    pub fn finish_hex(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
