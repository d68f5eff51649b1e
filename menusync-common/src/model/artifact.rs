// menusync-common/src/model/artifact.rs
use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::launcher::Fingerprint;

pub const MANIFEST_VERSION: u32 = 1;

/// A launcher materialised for a VM, recorded in the VM's manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub id: String,
    pub descriptor_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<PathBuf>,
    pub fingerprint: Fingerprint,
    pub synced_at: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Files owned by this record.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.descriptor_path).chain(self.icon_path.iter())
    }
}

/// Every ArtifactRecord of one VM, keyed by launcher identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactManifest {
    pub version: u32,
    pub vm: String,
    #[serde(default)]
    pub records: BTreeMap<String, ArtifactRecord>,
}

impl ArtifactManifest {
    pub fn new(vm: impl Into<String>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            vm: vm.into(),
            records: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ArtifactRecord> {
        self.records.get(id)
    }

    pub fn upsert(&mut self, record: ArtifactRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn remove(&mut self, id: &str) -> Option<ArtifactRecord> {
        self.records.remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
