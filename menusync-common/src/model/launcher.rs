// menusync-common/src/model/launcher.rs
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a descriptor was found relative to the VM it was discovered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Received from the VM itself.
    Own,
    /// Inherited from the VM's template.
    Template,
}

/// Content-derived staleness token (hex SHA-256 over descriptor and icon).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extra display fields in the order the caller asked for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFields(Vec<(String, String)>);

impl DisplayFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One candidate launcher as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherDescriptor {
    /// Stable key, the source `.desktop` file name.
    pub id: String,
    pub name: String,
    pub fields: DisplayFields,
    pub fingerprint: Fingerprint,
    pub source_kind: SourceKind,
    /// Desktop-entry template text with `%VMNAME%`-style placeholders.
    pub template: String,
    /// Source icon to materialise, when the VM sent one.
    pub icon: Option<PathBuf>,
}

impl LauncherDescriptor {
    /// Simple name-pair form: `<id> - <name>`.
    pub fn name_pair(&self) -> String {
        format!("{} - {}", self.id, self.name)
    }

    /// Field-delimited form: `<id>|<name>|<field>...`, missing fields empty.
    pub fn delimited(&self, selectors: &[String]) -> String {
        let mut columns = vec![self.id.as_str(), self.name.as_str()];
        columns.extend(
            selectors
                .iter()
                .map(|sel| self.fields.get(sel).unwrap_or("")),
        );
        columns.join("|")
    }
}
