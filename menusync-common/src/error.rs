// menusync-common/src/error.rs
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MenuError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("TOML Parsing Error: {0}")]
    Toml(#[from] Arc<toml::de::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("VM not found: {0}")]
    VmNotFound(String),

    #[error("'{0}' is not a TemplateVM")]
    NotATemplate(String),

    #[error("Invalid whitelist for '{vm}': not available in the VM: {}", .entries.join(", "))]
    InvalidWhitelistEntry { vm: String, entries: Vec<String> },

    #[error("Invalid template reference for '{vm}': {reason}")]
    InvalidTemplateReference { vm: String, reason: String },

    #[error("Source VM not found: {0}")]
    SourceNotFound(String),

    #[error("VM '{vm}' is unreachable: {reason}")]
    VmUnreachable { vm: String, reason: String },

    #[error("Synchronization of '{vm}' failed for {} launcher(s): {}", .failed.len(), format_failures(.failed))]
    PartialSyncFailure {
        vm: String,
        failed: Vec<(String, String)>,
    },

    #[error("Update of template '{template}' failed for {} dependent VM(s): {}", .failed.len(), format_failures(.failed))]
    PartialCascadeFailure {
        template: String,
        failed: Vec<(String, String)>,
    },

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Discovery Error: {0}")]
    Discovery(String),

    #[error("Lock Error: {0}")]
    Lock(String),

    #[error("Unstable format: {0}")]
    UnstableFormat(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

fn format_failures(failed: &[(String, String)]) -> String {
    failed
        .iter()
        .map(|(id, err)| format!("{id} ({err})"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl MenuError {
    /// Process exit code for this error, distinct per taxonomy member.
    pub fn exit_code(&self) -> i32 {
        match self {
            MenuError::VmNotFound(_) => 2,
            MenuError::NotATemplate(_) => 3,
            MenuError::InvalidWhitelistEntry { .. } => 4,
            MenuError::PartialSyncFailure { .. } => 5,
            MenuError::SourceNotFound(_) => 6,
            MenuError::InvalidTemplateReference { .. } => 7,
            MenuError::VmUnreachable { .. } => 8,
            MenuError::PartialCascadeFailure { .. } => 9,
            _ => 1,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, MenuError::VmUnreachable { .. })
    }
}

impl From<std::io::Error> for MenuError {
    fn from(err: std::io::Error) -> Self {
        MenuError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for MenuError {
    fn from(err: serde_json::Error) -> Self {
        MenuError::Json(Arc::new(err))
    }
}

impl From<toml::de::Error> for MenuError {
    fn from(err: toml::de::Error) -> Self {
        MenuError::Toml(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, MenuError>;
