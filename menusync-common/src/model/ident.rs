// menusync-common/src/model/ident.rs
use lazy_static::lazy_static;
use regex::Regex;

use crate::config::StorageNames;
use crate::error::{MenuError, Result};

lazy_static! {
    static ref VALID_VM_NAME_RE: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.-]{0,63}$").unwrap();
    static ref VALID_LAUNCHER_ID_RE: Regex = Regex::new(r"^[^./\s\x00][^/\s\x00]*\.desktop$").unwrap();
}

/// VM names become directory names under the data root, so they must be
/// plain path components that do not collide with the root's own entries.
pub fn validate_vm_name(name: &str) -> Result<()> {
    if VALID_VM_NAME_RE.is_match(name)
        && !name.contains("..")
        && !StorageNames::RESERVED.contains(&name)
    {
        Ok(())
    } else {
        Err(MenuError::InvalidIdentifier(name.to_string()))
    }
}

/// Launcher identifiers are source `.desktop` file names.
pub fn validate_launcher_id(id: &str) -> Result<()> {
    if VALID_LAUNCHER_ID_RE.is_match(id) && !id.contains("..") {
        Ok(())
    } else {
        Err(MenuError::InvalidIdentifier(id.to_string()))
    }
}

pub fn is_valid_launcher_id(id: &str) -> bool {
    validate_launcher_id(id).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launcher_ids() {
        assert!(is_valid_launcher_id("evince.desktop"));
        assert!(is_valid_launcher_id("org.gnome.Nautilus.desktop"));
        assert!(!is_valid_launcher_id("evince"));
        assert!(!is_valid_launcher_id("../evince.desktop"));
        assert!(!is_valid_launcher_id("sub/evince.desktop"));
        assert!(!is_valid_launcher_id(".hidden.desktop"));
        assert!(!is_valid_launcher_id("has space.desktop"));
        assert!(!is_valid_launcher_id("a..b.desktop"));
    }

    #[test]
    fn vm_names() {
        assert!(validate_vm_name("work").is_ok());
        assert!(validate_vm_name("fedora-40-xfce").is_ok());
        assert!(validate_vm_name("../etc").is_err());
        assert!(validate_vm_name("a/b").is_err());
        assert!(validate_vm_name("").is_err());
        assert!(validate_vm_name(".locks").is_err());
    }

    #[test]
    fn data_root_entries_are_not_vm_names() {
        assert!(validate_vm_name("logs").is_err());
        assert!(validate_vm_name("inventory.toml").is_err());
        assert!(validate_vm_name("logs2").is_ok());
        assert!(validate_vm_name("inventory").is_ok());
    }
}
