// menusync-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::debug;

use super::error::Result;

const FALLBACK_DATA_ROOT: &str = "/tmp/menusync";
const DATA_SUBDIR: &str = "menusync";
const MAX_DEFAULT_WORKERS: usize = 6;

/// Subdirectory and file names inside a VM's storage root.
pub struct StorageNames;

impl StorageNames {
    pub const TEMPLATES: &'static str = "apps.templates";
    pub const TEMPLATE_ICONS: &'static str = "apps.tempicons";
    pub const LAUNCHERS: &'static str = "apps";
    pub const ICONS: &'static str = "apps.icons";
    pub const WHITELIST: &'static str = "whitelisted-appmenus.list";
    pub const DEFAULT_WHITELIST: &'static str = "vm-whitelisted-appmenus.list";
    pub const MANIFEST: &'static str = "artifacts.json";
    pub const LOCKS: &'static str = ".locks";
    pub const LOGS: &'static str = "logs";
    pub const INVENTORY: &'static str = "inventory.toml";

    /// Data-root entries that are not VM storage roots.
    pub const RESERVED: &'static [&'static str] = &[Self::LOGS, Self::INVENTORY, Self::LOCKS];
}

/// Prefix of every rendered launcher file name.
pub const LAUNCHER_PREFIX: &str = "org.menusync.vm";
/// Prefix of the per-VM menu folder entry.
pub const DIRECTORY_PREFIX: &str = "menusync-vm-directory-";
/// Prefix of the per-VM settings launcher.
pub const SETTINGS_PREFIX: &str = "org.menusync.vm-settings";
/// Prefix of launchers that start a disposable from the VM.
pub const DISPVM_LAUNCHER_PREFIX: &str = "org.menusync.dispvm";
/// Prefix of the disposable menu folder entry.
pub const DISPVM_DIRECTORY_PREFIX: &str = "menusync-dispvm-directory-";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_root: PathBuf,
    pub inventory_path: PathBuf,
    pub max_workers: usize,
    pub discovery_command: Option<String>,
    pub refresh_command: Option<Vec<String>>,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading menusync configuration");

        let data_root = env::var("MENUSYNC_ROOT")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let root = BaseDirs::new().map_or_else(
                    || PathBuf::from(FALLBACK_DATA_ROOT),
                    |dirs| dirs.data_dir().join(DATA_SUBDIR),
                );
                debug!(
                    "MENUSYNC_ROOT not set or empty, falling back to default: {}",
                    root.display()
                );
                root
            });
        debug!("Effective data root set to: {}", data_root.display());

        let inventory_path = env::var("MENUSYNC_INVENTORY")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_root.join(StorageNames::INVENTORY));

        let max_workers = match env::var("MENUSYNC_WORKERS") {
            Ok(raw) => raw.trim().parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                super::error::MenuError::Config(format!(
                    "MENUSYNC_WORKERS must be a positive integer, got '{raw}'"
                ))
            })?,
            Err(_) => default_worker_count(),
        };
        debug!("Propagation worker budget: {}", max_workers);

        let discovery_command = env::var("MENUSYNC_DISCOVERY_CMD")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let refresh_command = env::var("MENUSYNC_REFRESH_CMD")
            .ok()
            .map(|s| s.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|argv| !argv.is_empty());

        debug!("Configuration loaded successfully.");
        Ok(Self {
            data_root,
            inventory_path,
            max_workers,
            discovery_command,
            refresh_command,
        })
    }

    /// Config rooted at an arbitrary directory, with no external commands.
    pub fn with_root(data_root: impl Into<PathBuf>) -> Self {
        let data_root = data_root.into();
        Self {
            inventory_path: data_root.join(StorageNames::INVENTORY),
            data_root,
            max_workers: default_worker_count(),
            discovery_command: None,
            refresh_command: None,
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_root.join(StorageNames::LOGS)
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.data_root.join(StorageNames::LOCKS)
    }

    pub fn lock_path(&self, vm: &str) -> PathBuf {
        self.locks_dir().join(format!("{vm}.lock"))
    }

    pub fn vm_dir(&self, vm: &str) -> PathBuf {
        self.data_root.join(vm)
    }

    pub fn templates_dir(&self, vm: &str) -> PathBuf {
        self.vm_dir(vm).join(StorageNames::TEMPLATES)
    }

    pub fn template_icons_dir(&self, vm: &str) -> PathBuf {
        self.vm_dir(vm).join(StorageNames::TEMPLATE_ICONS)
    }

    pub fn launchers_dir(&self, vm: &str) -> PathBuf {
        self.vm_dir(vm).join(StorageNames::LAUNCHERS)
    }

    pub fn icons_dir(&self, vm: &str) -> PathBuf {
        self.vm_dir(vm).join(StorageNames::ICONS)
    }

    pub fn whitelist_path(&self, vm: &str) -> PathBuf {
        self.vm_dir(vm).join(StorageNames::WHITELIST)
    }

    pub fn default_whitelist_path(&self, vm: &str) -> PathBuf {
        self.vm_dir(vm).join(StorageNames::DEFAULT_WHITELIST)
    }

    pub fn manifest_path(&self, vm: &str) -> PathBuf {
        self.vm_dir(vm).join(StorageNames::MANIFEST)
    }

    /// File name of the rendered launcher for `id` in `vm`'s menu.
    pub fn launcher_file_name(&self, vm: &str, id: &str) -> String {
        format!("{LAUNCHER_PREFIX}.{vm}.{id}")
    }

    pub fn launcher_path(&self, vm: &str, id: &str) -> PathBuf {
        self.launchers_dir(vm).join(self.launcher_file_name(vm, id))
    }

    /// Materialised icon for `id`: `<stem>.png`.
    pub fn icon_path(&self, vm: &str, id: &str) -> PathBuf {
        let stem = id.strip_suffix(".desktop").unwrap_or(id);
        self.icons_dir(vm).join(format!("{stem}.png"))
    }

    pub fn directory_entry_path(&self, vm: &str) -> PathBuf {
        self.launchers_dir(vm)
            .join(format!("{DIRECTORY_PREFIX}{vm}.directory"))
    }

    pub fn settings_entry_path(&self, vm: &str) -> PathBuf {
        self.launchers_dir(vm)
            .join(format!("{SETTINGS_PREFIX}.{vm}.desktop"))
    }

    pub fn dispvm_launcher_file_name(&self, vm: &str, id: &str) -> String {
        format!("{DISPVM_LAUNCHER_PREFIX}.{vm}.{id}")
    }

    pub fn dispvm_launcher_path(&self, vm: &str, id: &str) -> PathBuf {
        self.launchers_dir(vm)
            .join(self.dispvm_launcher_file_name(vm, id))
    }

    pub fn dispvm_directory_entry_path(&self, vm: &str) -> PathBuf {
        self.launchers_dir(vm)
            .join(format!("{DISPVM_DIRECTORY_PREFIX}{vm}.directory"))
    }
}

fn default_worker_count() -> usize {
    std::cmp::max(1, num_cpus::get_physical().saturating_sub(1)).min(MAX_DEFAULT_WORKERS)
}

pub fn load_config() -> Result<Config> {
    Config::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_vm_paths_are_derived_from_root() {
        let config = Config::with_root("/data");
        assert_eq!(config.vm_dir("work"), PathBuf::from("/data/work"));
        assert_eq!(
            config.launcher_path("work", "evince.desktop"),
            PathBuf::from("/data/work/apps/org.menusync.vm.work.evince.desktop")
        );
        assert_eq!(
            config.icon_path("work", "evince.desktop"),
            PathBuf::from("/data/work/apps.icons/evince.png")
        );
        assert_eq!(
            config.whitelist_path("work"),
            PathBuf::from("/data/work/whitelisted-appmenus.list")
        );
        assert_eq!(
            config.default_whitelist_path("fedora"),
            PathBuf::from("/data/fedora/vm-whitelisted-appmenus.list")
        );
        assert_eq!(config.lock_path("work"), PathBuf::from("/data/.locks/work.lock"));
        assert_eq!(
            config.settings_entry_path("work"),
            PathBuf::from("/data/work/apps/org.menusync.vm-settings.work.desktop")
        );
        assert_eq!(
            config.dispvm_launcher_path("work", "xterm.desktop"),
            PathBuf::from("/data/work/apps/org.menusync.dispvm.work.xterm.desktop")
        );
    }

    #[test]
    fn default_worker_budget_is_bounded() {
        let n = default_worker_count();
        assert!((1..=MAX_DEFAULT_WORKERS).contains(&n));
    }
}
