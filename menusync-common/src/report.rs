// menusync-common/src/report.rs
use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{MenuError, Result};

/// Outcome of one synchronize run for one VM.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub vm: String,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
    /// Identifiers that could not be materialised, with the reason.
    pub failed: Vec<(String, String)>,
    /// Folder, settings or disposable entries were rewritten.
    pub menu_entries_changed: bool,
}

impl SyncReport {
    pub fn new(vm: impl Into<String>) -> Self {
        Self {
            vm: vm.into(),
            ..Self::default()
        }
    }

    /// Whether this run wrote or deleted anything.
    pub fn changed(&self) -> bool {
        self.menu_entries_changed
            || !(self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty())
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// `Ok(self)` when every identifier succeeded, `PartialSyncFailure` otherwise.
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(MenuError::PartialSyncFailure {
                vm: self.vm,
                failed: self.failed,
            })
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} removed, {} unchanged{}",
            self.created.len(),
            self.updated.len(),
            self.removed.len(),
            self.unchanged.len(),
            if self.failed.is_empty() {
                String::new()
            } else {
                format!(", {} failed", self.failed.len())
            }
        )
    }
}

/// Per-child outcome inside a cascade.
#[derive(Debug, Clone)]
pub enum ChildOutcome {
    Synced(SyncReport),
    Failed(MenuError),
}

impl ChildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ChildOutcome::Synced(r) if r.is_success())
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            ChildOutcome::Synced(r) if r.is_success() => None,
            ChildOutcome::Synced(r) => Some(
                MenuError::PartialSyncFailure {
                    vm: r.vm.clone(),
                    failed: r.failed.clone(),
                }
                .to_string(),
            ),
            ChildOutcome::Failed(e) => Some(e.to_string()),
        }
    }
}

/// Aggregate outcome of a template update and its cascade.
#[derive(Debug, Clone)]
pub struct CascadeReport {
    pub template: String,
    pub template_outcome: ChildOutcome,
    pub children: BTreeMap<String, ChildOutcome>,
}

impl CascadeReport {
    pub fn failed_children(&self) -> Vec<(String, String)> {
        self.children
            .iter()
            .filter_map(|(name, outcome)| outcome.error_message().map(|e| (name.clone(), e)))
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.template_outcome.is_success() && self.children.values().all(ChildOutcome::is_success)
    }

    /// The template's own error wins; otherwise any child failure becomes
    /// `PartialCascadeFailure`.
    pub fn into_result(self) -> Result<Self> {
        match &self.template_outcome {
            ChildOutcome::Failed(e) => return Err(e.clone()),
            ChildOutcome::Synced(r) if !r.is_success() => {
                return Err(MenuError::PartialSyncFailure {
                    vm: r.vm.clone(),
                    failed: r.failed.clone(),
                })
            }
            ChildOutcome::Synced(_) => {}
        }
        let failed = self.failed_children();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(MenuError::PartialCascadeFailure {
                template: self.template,
                failed,
            })
        }
    }
}
