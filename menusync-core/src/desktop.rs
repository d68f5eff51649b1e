// menusync-core/src/desktop.rs
//! Desktop-entry templates: parsing what a VM sent, building templates from
//! key/value discovery output, and rendering them for a concrete VM.
use std::path::Path;

use menusync_common::model::{DisplayFields, VmInfo, VmKind};

pub const MAIN_SECTION: &str = "[Desktop Entry]";
pub const NAME_PREFIX: &str = "%VMNAME%: ";
pub const EXEC_PREFIX: &str = "qubes-desktop-run ";
/// Launch command used when the entry runs in a fresh disposable.
pub const DISPVM_EXEC_KEY: &str = "X-Qubes-DispvmExec";
const NON_DISPVM_EXEC_KEY: &str = "X-Qubes-NonDispvmExec";

/// Template seeded into VMs that keep their own application list.
pub const START_ENTRY_ID: &str = "qubes-start.desktop";
pub const START_TEMPLATE: &str = "[Desktop Entry]
Version=1.0
Type=Application
Exec=qvm-start --quiet --tray %VMNAME%
Icon=%XDGICON%
Terminal=false
Name=%VMNAME%: Start
GenericName=%VMNAME%: Start
StartupNotify=false
Categories=System;X-Qubes-VM;
";

const SETTINGS_TEMPLATE: &str = "[Desktop Entry]
Version=1.0
Type=Application
Exec=qubes-vm-settings %VMNAME%
Icon=qubes-settings
Terminal=false
Name=%VMNAME%: Qube Settings
GenericName=%VMNAME%: Qube Settings
StartupNotify=false
Categories=System;X-Qubes-VM;
";

const DISPVM_DIRECTORY_TEMPLATE: &str = "[Desktop Entry]
Encoding=UTF-8
Type=Directory
X-Qubes-VmName=%VMNAME%
X-Qubes-DispvmName=%VMNAME%
Name=Disposable: %VMNAME%
Icon=%XDGICON%
";

/// Keys carried over from key/value discovery output.
pub const ALLOWED_KEYS: &[&str] = &[
    "Name",
    "GenericName",
    "Comment",
    "Categories",
    "Exec",
    "Icon",
    "Keywords",
    "MimeType",
    DISPVM_EXEC_KEY,
];

/// What the menu needs from a template's main section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntry {
    pub name: Option<String>,
    pub fields: DisplayFields,
}

/// Reads `Name` and the selected fields from the `[Desktop Entry]` section.
pub fn parse_entry(raw: &str, selectors: &[String]) -> ParsedEntry {
    let mut parsed = ParsedEntry::default();
    let mut main_section = false;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.starts_with('[') {
            main_section = line == MAIN_SECTION;
            continue;
        }
        if !main_section || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key == "Name" && parsed.name.is_none() {
            parsed.name = Some(value.strip_prefix(NAME_PREFIX).unwrap_or(value).to_string());
        }
        if selectors.iter().any(|s| s == key) {
            parsed.fields.insert(key, value);
        }
    }
    // Selected but absent fields stay absent; order follows the selectors.
    let mut ordered = DisplayFields::new();
    for sel in selectors {
        if let Some(v) = parsed.fields.get(sel) {
            ordered.insert(sel.as_str(), v);
        }
    }
    parsed.fields = ordered;
    parsed
}

/// Builds a launcher template from discovery key/value pairs.
/// Keys outside [`ALLOWED_KEYS`] are dropped; `Icon` is always `%XDGICON%`.
pub fn build_template(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    out.push_str(MAIN_SECTION);
    out.push_str("\nVersion=1.0\nType=Application\nTerminal=false\n");
    out.push_str("X-Qubes-VmName=%VMNAME%\nIcon=%XDGICON%\n");
    if let Some((_, name)) = pairs.iter().find(|(k, _)| k == "Name") {
        out.push_str(&format!("Name={NAME_PREFIX}{name}\n"));
    }
    for (key, value) in pairs {
        match key.as_str() {
            "Name" | "Icon" => {}
            "Exec" => out.push_str(&format!("Exec={EXEC_PREFIX}{value}\n")),
            k if ALLOWED_KEYS.contains(&k) => out.push_str(&format!("{key}={value}\n")),
            _ => {}
        }
    }
    out
}

/// Substitutes the VM placeholders.
pub fn render(template: &str, vm_name: &str, vm_dir: &Path, icon: &str) -> String {
    template
        .replace("%VMNAME%", vm_name)
        .replace("%VMDIR%", &vm_dir.to_string_lossy())
        .replace("%XDGICON%", icon)
}

fn directory_template(kind: VmKind) -> &'static str {
    match kind {
        VmKind::TemplateVM => {
            "[Desktop Entry]\nEncoding=UTF-8\nType=Directory\nX-Qubes-VmName=%VMNAME%\nName=Template: %VMNAME%\nIcon=%XDGICON%\n"
        }
        VmKind::AppVM => {
            "[Desktop Entry]\nEncoding=UTF-8\nType=Directory\nX-Qubes-VmName=%VMNAME%\nName=Qube: %VMNAME%\nIcon=%XDGICON%\n"
        }
        VmKind::StandaloneVM => {
            "[Desktop Entry]\nEncoding=UTF-8\nType=Directory\nX-Qubes-VmName=%VMNAME%\nName=Standalone: %VMNAME%\nIcon=%XDGICON%\n"
        }
    }
}

/// The menu folder entry grouping a VM's launchers.
pub fn render_directory_entry(vm: &VmInfo, vm_dir: &Path) -> String {
    render(directory_template(vm.kind), &vm.name, vm_dir, vm.icon())
}

/// The launcher that opens the VM's settings.
pub fn render_settings_entry(vm: &VmInfo, vm_dir: &Path) -> String {
    render(SETTINGS_TEMPLATE, &vm.name, vm_dir, vm.icon())
}

pub fn render_dispvm_directory_entry(vm: &VmInfo, vm_dir: &Path) -> String {
    render(DISPVM_DIRECTORY_TEMPLATE, &vm.name, vm_dir, &vm.dispvm_icon())
}

/// Swaps the disposable launch command into `Exec`. `None` when the entry
/// has an `Exec` but no disposable variant.
pub fn dispvm_variant(template: &str) -> Option<String> {
    let dispvm_key = format!("\n{DISPVM_EXEC_KEY}=");
    if !template.contains(&dispvm_key) && template.contains("\nExec=") {
        return None;
    }
    Some(
        template
            .replace("\nExec=", &format!("\n{NON_DISPVM_EXEC_KEY}="))
            .replace(&dispvm_key, "\nExec="),
    )
}
