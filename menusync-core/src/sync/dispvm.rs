// menusync-core/src/sync/dispvm.rs
//! Second menu for VMs that serve as disposable templates: the same
//! launchers, started in a fresh disposable.
use std::collections::HashSet;

use menusync_common::config::{Config, DISPVM_LAUNCHER_PREFIX};
use menusync_common::error::Result;
use menusync_common::model::{LauncherDescriptor, VmInfo};
use tracing::{debug, info};

use crate::desktop;

/// Writes the disposable menu of `vm`, or clears it when the VM has none.
/// Returns whether any file changed.
pub(crate) fn sync_dispvm_menu(
    config: &Config,
    vm: &VmInfo,
    offered: &[&LauncherDescriptor],
) -> Result<bool> {
    let mut changed = false;
    let mut keep: HashSet<String> = HashSet::new();
    let directory = config.dispvm_directory_entry_path(&vm.name);

    if vm.dispvm_menu {
        let vm_dir = config.vm_dir(&vm.name);
        let icon = vm.dispvm_icon();
        let entry = desktop::render_dispvm_directory_entry(vm, &vm_dir);
        changed |= menusync_aio::write_if_changed(&directory, entry.as_bytes())?;
        for descriptor in offered {
            let Some(template) = desktop::dispvm_variant(&descriptor.template) else {
                debug!(
                    "[{}] {} has no disposable launch command",
                    vm.name, descriptor.id
                );
                continue;
            };
            let rendered = desktop::render(&template, &vm.name, &vm_dir, &icon);
            let path = config.dispvm_launcher_path(&vm.name, &descriptor.id);
            changed |= menusync_aio::write_if_changed(&path, rendered.as_bytes())?;
            keep.insert(config.dispvm_launcher_file_name(&vm.name, &descriptor.id));
        }
    } else {
        changed |= menusync_aio::remove_file_if_exists(&directory)?;
    }

    let prefix = format!("{DISPVM_LAUNCHER_PREFIX}.{}.", vm.name);
    let launchers = config.launchers_dir(&vm.name);
    for name in menusync_aio::list_file_names(&launchers)? {
        if name.starts_with(&prefix) && !keep.contains(&name) {
            info!("[{}] deleting disposable launcher {}", vm.name, name);
            changed |= menusync_aio::remove_file_if_exists(&launchers.join(&name))?;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use menusync_common::model::{DisplayFields, Fingerprint, SourceKind, VmKind};

    use super::*;

    fn descriptor(id: &str, template: &str) -> LauncherDescriptor {
        LauncherDescriptor {
            id: id.into(),
            name: id.into(),
            fields: DisplayFields::new(),
            fingerprint: Fingerprint::new("f0"),
            source_kind: SourceKind::Own,
            template: template.into(),
            icon: None,
        }
    }

    #[test]
    fn writes_supported_entries_and_clears_when_disabled() {
        let root = tempfile::tempdir().unwrap();
        let config = Config::with_root(root.path());
        let mut vm = VmInfo::new("dvm", VmKind::AppVM).with_dispvm_menu();
        vm.label = Some("red".into());
        let xterm = descriptor(
            "xterm.desktop",
            "[Desktop Entry]\nName=%VMNAME%: XTerm\nIcon=%XDGICON%\nExec=xterm\nX-Qubes-DispvmExec=xterm -dvm\n",
        );
        let start = descriptor(desktop::START_ENTRY_ID, desktop::START_TEMPLATE);

        assert!(sync_dispvm_menu(&config, &vm, &[&xterm, &start]).unwrap());
        let written = fs::read_to_string(config.dispvm_launcher_path("dvm", "xterm.desktop")).unwrap();
        assert!(written.contains("\nExec=xterm -dvm\n"));
        assert!(written.contains("Icon=dispvm-red"));
        assert!(!config.dispvm_launcher_path("dvm", desktop::START_ENTRY_ID).exists());
        assert!(config.dispvm_directory_entry_path("dvm").is_file());

        assert!(!sync_dispvm_menu(&config, &vm, &[&xterm, &start]).unwrap());

        vm.dispvm_menu = false;
        assert!(sync_dispvm_menu(&config, &vm, &[&xterm]).unwrap());
        assert!(!config.dispvm_launcher_path("dvm", "xterm.desktop").exists());
        assert!(!config.dispvm_directory_entry_path("dvm").exists());
    }
}
