// menusync-core/tests/reconcile.rs
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use menusync_common::cascade::CascadeEvent;
use menusync_common::config::Config;
use menusync_common::error::MenuError;
use menusync_common::model::{Inventory, SourceKind, VmInfo, VmKind, Whitelist};
use menusync_common::report::ChildOutcome;
use menusync_core::catalog::TemplateSource;
use menusync_core::desktop;
use menusync_core::{
    compute_effective, init, remove, synchronize, update, update_with_cascade, CatalogAdapter,
    InitOptions, MenuContext, RawEntry, StaticDiscovery, SyncOptions, UpdateOutcome,
    WhitelistOrigin, WhitelistStore,
};
use tempfile::TempDir;
use tokio::sync::broadcast;

struct Fixture {
    dir: TempDir,
    discovery: Arc<StaticDiscovery>,
    ctx: MenuContext,
}

impl Fixture {
    fn new(vms: Vec<VmInfo>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let discovery = Arc::new(StaticDiscovery::new());
        let mut config = Config::with_root(dir.path().join("data"));
        config.max_workers = 2;
        let ctx = MenuContext::new(
            config,
            Inventory::new(vms).unwrap(),
            CatalogAdapter::new(discovery.clone()),
        );
        Self {
            dir,
            discovery,
            ctx,
        }
    }

    fn config(&self) -> &Config {
        &self.ctx.config
    }

    fn icon_source(&self, id: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join("src-icons").join(format!("{id}.png"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }
}

fn entry(id: &str, name: &str) -> RawEntry {
    RawEntry::inline(
        id,
        format!("[Desktop Entry]\nType=Application\nName=%VMNAME%: {name}\nIcon=%XDGICON%\n"),
    )
}

fn list(ids: &[&str]) -> Whitelist {
    Whitelist::new(ids.iter().copied()).unwrap()
}

fn standalone() -> Fixture {
    let fx = Fixture::new(vec![VmInfo::new("work", VmKind::StandaloneVM)]);
    fx.discovery.set_reachable(
        "work",
        vec![
            entry("a.desktop", "Alpha"),
            entry("b.desktop", "Beta"),
            entry("c.desktop", "Gamma"),
        ],
    );
    fx
}

fn template_family() -> Fixture {
    let fx = Fixture::new(vec![
        VmInfo::new("fedora", VmKind::TemplateVM),
        VmInfo::new("v1", VmKind::AppVM).with_template("fedora"),
        VmInfo::new("v2", VmKind::AppVM).with_template("fedora"),
        VmInfo::new("other", VmKind::AppVM),
    ]);
    let apps = vec![
        entry("a.desktop", "Alpha"),
        entry("b.desktop", "Beta"),
        entry("c.desktop", "Gamma"),
    ];
    fx.discovery.set_reachable("fedora", apps.clone());
    fx.discovery.set_reachable("v1", apps);
    fx.discovery.set_unreachable("v2");
    fx
}

#[test]
fn second_sync_without_changes_is_a_no_op() {
    let fx = standalone();
    let first = synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    assert_eq!(first.created, vec!["a.desktop", "b.desktop", "c.desktop"]);

    let second = synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    assert!(second.created.is_empty());
    assert!(second.updated.is_empty());
    assert!(second.removed.is_empty());
    assert_eq!(second.unchanged.len(), 3);
    assert!(!second.changed());
}

#[test]
fn rendered_launcher_names_the_vm() {
    let fx = standalone();
    synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    let launcher = fx.config().launcher_path("work", "a.desktop");
    assert_eq!(
        fs::read_to_string(launcher).unwrap(),
        "[Desktop Entry]\nType=Application\nName=work: Alpha\nIcon=standalonevm-black\n"
    );
    let dir_entry = fs::read_to_string(fx.config().directory_entry_path("work")).unwrap();
    assert!(dir_entry.contains("Name=Standalone: work"));
}

#[test]
fn settings_launcher_is_kept_but_not_reported() {
    let fx = standalone();
    let first = synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    assert_eq!(first.created.len(), 3);
    assert!(first.menu_entries_changed);
    let settings = fx.config().settings_entry_path("work");
    assert!(fs::read_to_string(&settings)
        .unwrap()
        .contains("Name=work: Qube Settings"));

    WhitelistStore::new(&fx.ctx)
        .set("work", list(&["a.desktop"]))
        .unwrap();
    let second = synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    assert_eq!(second.removed, vec!["b.desktop", "c.desktop"]);
    assert!(!second.menu_entries_changed);
    assert!(settings.is_file());
    assert!(fx.config().directory_entry_path("work").is_file());
}

#[test]
fn disposable_template_gets_a_second_menu() {
    let fx = Fixture::new(vec![
        VmInfo::new("fedora", VmKind::TemplateVM),
        VmInfo::new("fedora-dvm", VmKind::AppVM)
            .with_template("fedora")
            .with_dispvm_menu(),
    ]);
    fx.discovery.set_reachable(
        "fedora-dvm",
        vec![
            RawEntry::inline(
                "xterm.desktop",
                "[Desktop Entry]\nName=%VMNAME%: XTerm\nIcon=%XDGICON%\nExec=xterm\nX-Qubes-DispvmExec=xterm -dvm\n",
            ),
            RawEntry::inline(
                "files.desktop",
                "[Desktop Entry]\nName=%VMNAME%: Files\nIcon=%XDGICON%\nExec=nautilus\n",
            ),
        ],
    );

    let report = synchronize(&fx.ctx, "fedora-dvm", SyncOptions::default()).unwrap();
    assert_eq!(report.created, vec!["xterm.desktop", "files.desktop"]);
    let dvm_xterm = fx.config().dispvm_launcher_path("fedora-dvm", "xterm.desktop");
    assert!(fs::read_to_string(&dvm_xterm)
        .unwrap()
        .contains("\nExec=xterm -dvm\n"));
    assert!(!fx
        .config()
        .dispvm_launcher_path("fedora-dvm", "files.desktop")
        .exists());
    assert!(fx.config().dispvm_directory_entry_path("fedora-dvm").is_file());

    let again = synchronize(&fx.ctx, "fedora-dvm", SyncOptions::default()).unwrap();
    assert!(!again.changed());
    assert!(dvm_xterm.is_file());
}

#[test]
fn template_default_applies_until_explicit_whitelist_is_set() {
    let fx = template_family();
    let store = WhitelistStore::new(&fx.ctx);
    store
        .set_default("fedora", list(&["a.desktop", "b.desktop"]))
        .unwrap();

    let effective = compute_effective(&fx.ctx, "v1").unwrap();
    assert_eq!(effective.ids, vec!["a.desktop", "b.desktop"]);
    assert_eq!(
        effective.origin,
        WhitelistOrigin::TemplateDefault("fedora".to_string())
    );

    store.set("v1", list(&["c.desktop"])).unwrap();
    let effective = compute_effective(&fx.ctx, "v1").unwrap();
    assert_eq!(effective.ids, vec!["c.desktop"]);
    assert_eq!(effective.origin, WhitelistOrigin::Explicit);
    assert_eq!(
        store.get_default("fedora").unwrap(),
        Some(list(&["a.desktop", "b.desktop"]))
    );
}

#[test]
fn full_catalog_is_the_fallback() {
    let fx = standalone();
    let effective = compute_effective(&fx.ctx, "work").unwrap();
    assert_eq!(effective.origin, WhitelistOrigin::Catalog);
    assert_eq!(effective.ids, vec!["a.desktop", "b.desktop", "c.desktop"]);
}

#[test]
fn cascade_isolates_child_failures() {
    let fx = template_family();
    let (tx, mut rx) = broadcast::channel(64);

    let report =
        update_with_cascade(&fx.ctx, "fedora", SyncOptions::default(), Some(tx)).unwrap();

    assert!(report.template_outcome.is_success());
    assert!(fx.config().launcher_path("fedora", "a.desktop").is_file());
    assert!(report.children["v1"].is_success());
    assert!(matches!(
        &report.children["v2"],
        ChildOutcome::Failed(MenuError::VmUnreachable { vm, .. }) if vm == "v2"
    ));
    assert!(!report.children.contains_key("other"));
    assert!(fx.config().launcher_path("v1", "b.desktop").is_file());

    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    assert!(matches!(
        events.first(),
        Some(CascadeEvent::CascadeStarted { total_children: 2, .. })
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, CascadeEvent::ChildFailed { vm, .. } if vm == "v2")));
    assert!(matches!(
        events.last(),
        Some(CascadeEvent::CascadeFinished {
            success_count: 1,
            fail_count: 1,
            ..
        })
    ));

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, MenuError::PartialCascadeFailure { ref failed, .. } if failed.len() == 1));
    assert_eq!(err.exit_code(), 9);
}

#[test]
fn update_cascades_only_for_templates() {
    let fx = template_family();
    let outcome = update(&fx.ctx, "v1", SyncOptions::default(), None).unwrap();
    assert!(matches!(outcome, UpdateOutcome::Single(_)));
    let outcome = update(&fx.ctx, "fedora", SyncOptions::default(), None).unwrap();
    assert!(matches!(outcome, UpdateOutcome::Cascade(ref c) if c.children.len() == 2));
}

#[test]
fn cascade_requires_a_template() {
    let fx = template_family();
    let err = update_with_cascade(&fx.ctx, "v1", SyncOptions::default(), None).unwrap_err();
    assert!(matches!(err, MenuError::NotATemplate(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn dropped_identifier_is_pruned() {
    let fx = standalone();
    let icon = fx.icon_source("b", b"beta-icon");
    fx.discovery.set_reachable(
        "work",
        vec![
            entry("a.desktop", "Alpha"),
            RawEntry {
                icon: Some(icon),
                ..entry("b.desktop", "Beta")
            },
        ],
    );
    let store = WhitelistStore::new(&fx.ctx);
    store.set("work", list(&["a.desktop", "b.desktop"])).unwrap();
    synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    let b_launcher = fx.config().launcher_path("work", "b.desktop");
    let b_icon = fx.config().icon_path("work", "b.desktop");
    assert!(b_launcher.is_file());
    assert_eq!(fs::read(&b_icon).unwrap(), b"beta-icon");

    store.set("work", list(&["a.desktop"])).unwrap();
    let report = synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    assert_eq!(report.removed, vec!["b.desktop"]);
    assert_eq!(report.unchanged, vec!["a.desktop"]);
    assert!(!b_launcher.exists());
    assert!(!b_icon.exists());
}

#[test]
fn uninstalled_whitelisted_app_is_pruned_across_a_cascade() {
    let fx = template_family();
    fx.discovery.set_reachable("v2", vec![entry("a.desktop", "Alpha")]);
    WhitelistStore::new(&fx.ctx)
        .set_default("fedora", list(&["a.desktop", "b.desktop"]))
        .unwrap();
    init(&fx.ctx, "v1", &InitOptions::default()).unwrap();
    let first = synchronize(&fx.ctx, "v1", SyncOptions::default()).unwrap();
    assert_eq!(first.created, vec!["a.desktop", "b.desktop"]);
    let b_launcher = fx.config().launcher_path("v1", "b.desktop");
    assert!(b_launcher.is_file());

    let remaining = vec![entry("a.desktop", "Alpha"), entry("c.desktop", "Gamma")];
    fx.discovery.set_reachable("fedora", remaining.clone());
    fx.discovery.set_reachable("v1", remaining);

    let report =
        update_with_cascade(&fx.ctx, "fedora", SyncOptions::default(), None).unwrap();
    let ChildOutcome::Synced(v1) = &report.children["v1"] else {
        panic!("v1 should have synced: {:?}", report.children["v1"]);
    };
    assert_eq!(v1.removed, vec!["b.desktop"]);
    assert!(v1.failed.is_empty());
    assert!(!b_launcher.exists());
    assert!(report.into_result().is_ok());

    let again =
        update_with_cascade(&fx.ctx, "fedora", SyncOptions::default(), None).unwrap();
    let ChildOutcome::Synced(v1) = &again.children["v1"] else {
        panic!("v1 should have synced: {:?}", again.children["v1"]);
    };
    assert!(v1.removed.is_empty());
    assert_eq!(v1.unchanged, vec!["a.desktop"]);
    assert!(again.into_result().is_ok());
}

#[test]
fn changed_source_is_regenerated() {
    let fx = standalone();
    synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    fx.discovery.set_reachable(
        "work",
        vec![
            entry("a.desktop", "Alpha 2"),
            entry("b.desktop", "Beta"),
            entry("c.desktop", "Gamma"),
        ],
    );
    let report = synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    assert_eq!(report.updated, vec!["a.desktop"]);
    assert_eq!(report.unchanged.len(), 2);
    assert!(
        fs::read_to_string(fx.config().launcher_path("work", "a.desktop"))
            .unwrap()
            .contains("Name=work: Alpha 2")
    );
}

#[test]
fn deleted_artifact_is_restored() {
    let fx = standalone();
    synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    fs::remove_file(fx.config().launcher_path("work", "c.desktop")).unwrap();
    let report = synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    assert_eq!(report.updated, vec!["c.desktop"]);
    assert!(fx.config().launcher_path("work", "c.desktop").is_file());
}

#[test]
fn force_regenerates_everything() {
    let fx = standalone();
    synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    let report = synchronize(&fx.ctx, "work", SyncOptions { force: true }).unwrap();
    assert_eq!(report.updated, vec!["a.desktop", "b.desktop", "c.desktop"]);
    assert!(report.created.is_empty());
    assert!(report.unchanged.is_empty());
    assert!(report.removed.is_empty());
}

#[test]
fn whitelist_round_trips_in_order() {
    let fx = standalone();
    let store = WhitelistStore::new(&fx.ctx);
    let wanted = list(&["c.desktop", "a.desktop", "b.desktop"]);
    let update = store.set("work", wanted.clone()).unwrap();
    assert!(update.validated);
    assert_eq!(store.get("work").unwrap(), Some(wanted));
}

#[test]
fn unknown_whitelist_entry_is_rejected() {
    let fx = standalone();
    let err = WhitelistStore::new(&fx.ctx)
        .set("work", list(&["a.desktop", "nope.desktop"]))
        .unwrap_err();
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn unreadable_entries_fail_individually() {
    let fx = standalone();
    fx.discovery.set_reachable(
        "work",
        vec![
            entry("a.desktop", "Alpha"),
            RawEntry::inline("broken.desktop", "[Desktop Entry]\nType=Application\n"),
            RawEntry {
                template: TemplateSource::Path(fx.dir.path().join("missing.desktop")),
                ..entry("gone.desktop", "Gone")
            },
        ],
    );
    let report = synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    assert_eq!(report.created, vec!["a.desktop"]);
    let failed: Vec<_> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(failed, vec!["broken.desktop", "gone.desktop"]);
    let err = report.into_result().unwrap_err();
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn unreachable_target_is_fatal() {
    let fx = template_family();
    let err = synchronize(&fx.ctx, "v2", SyncOptions::default()).unwrap_err();
    assert!(err.is_unreachable());
    assert_eq!(err.exit_code(), 8);
}

#[test]
fn bad_template_reference_aborts() {
    let fx = Fixture::new(vec![
        VmInfo::new("work", VmKind::AppVM).with_template("work"),
    ]);
    let err = synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap_err();
    assert!(matches!(err, MenuError::InvalidTemplateReference { .. }));
    assert_eq!(err.exit_code(), 7);
}

#[test]
fn unknown_vm_is_not_found() {
    let fx = standalone();
    let err = synchronize(&fx.ctx, "ghost", SyncOptions::default()).unwrap_err();
    assert!(matches!(err, MenuError::VmNotFound(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn removal_is_idempotent_and_needs_no_inventory_entry() {
    let fx = standalone();
    synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    let first = remove(&fx.ctx, "work").unwrap();
    assert!(first.existed);
    assert!(first.files_removed >= 4);
    assert!(!fx.config().vm_dir("work").exists());

    let second = remove(&fx.ctx, "work").unwrap();
    assert!(!second.existed);
    assert!(remove(&fx.ctx, "deleted-long-ago").is_ok());
}

#[test]
fn removing_a_template_leaves_dependents_alone() {
    let fx = template_family();
    update_with_cascade(&fx.ctx, "fedora", SyncOptions::default(), None).unwrap();
    remove(&fx.ctx, "fedora").unwrap();
    assert!(fx.config().launcher_path("v1", "a.desktop").is_file());
    assert!(fx.config().manifest_path("v1").is_file());
}

#[test]
fn init_is_idempotent_and_seeds_from_template_default() {
    let fx = template_family();
    WhitelistStore::new(&fx.ctx)
        .set_default("fedora", list(&["b.desktop"]))
        .unwrap();

    let report = init(&fx.ctx, "v1", &InitOptions::default()).unwrap();
    assert!(report.created);
    assert!(report.whitelist_seeded);
    assert_eq!(
        WhitelistStore::new(&fx.ctx).get("v1").unwrap(),
        Some(list(&["b.desktop"]))
    );

    let again = init(&fx.ctx, "v1", &InitOptions::default()).unwrap();
    assert!(!again.created);
}

#[test]
fn init_clones_whitelist_and_renders_records_from_source() {
    let fx = template_family();
    let store = WhitelistStore::new(&fx.ctx);
    store.set("v1", list(&["a.desktop", "c.desktop"])).unwrap();
    synchronize(&fx.ctx, "v1", SyncOptions::default()).unwrap();
    fx.discovery.set_reachable(
        "other",
        vec![entry("a.desktop", "Alpha"), entry("c.desktop", "Gamma")],
    );

    let options = InitOptions {
        source: Some("v1".to_string()),
        reset: false,
    };
    let report = init(&fx.ctx, "other", &options).unwrap();
    assert_eq!(report.seeded_from.as_deref(), Some("v1"));
    assert_eq!(report.records_seeded, 2);
    assert_eq!(store.get("other").unwrap(), Some(list(&["a.desktop", "c.desktop"])));
    assert!(fs::read_to_string(fx.config().launcher_path("other", "a.desktop"))
        .unwrap()
        .contains("Name=other: Alpha"));

    let sync = synchronize(&fx.ctx, "other", SyncOptions::default()).unwrap();
    assert!(sync.created.is_empty());
    assert!(sync.updated.is_empty());
    assert_eq!(sync.unchanged, vec!["a.desktop", "c.desktop"]);
}

#[test]
fn init_from_source_leaves_unreachable_target_without_records() {
    let fx = template_family();
    WhitelistStore::new(&fx.ctx)
        .set("v1", list(&["a.desktop"]))
        .unwrap();
    synchronize(&fx.ctx, "v1", SyncOptions::default()).unwrap();

    let options = InitOptions {
        source: Some("v1".to_string()),
        reset: false,
    };
    let report = init(&fx.ctx, "other", &options).unwrap();
    assert_eq!(report.records_seeded, 0);
    assert!(!fx.config().manifest_path("other").exists());
    assert!(!fx.config().launcher_path("other", "a.desktop").exists());

    fx.discovery
        .set_reachable("other", vec![entry("a.desktop", "Alpha")]);
    let sync = synchronize(&fx.ctx, "other", SyncOptions::default()).unwrap();
    assert_eq!(sync.created, vec!["a.desktop"]);
}

#[test]
fn init_with_missing_source_fails() {
    let fx = template_family();
    let options = InitOptions {
        source: Some("ghost".to_string()),
        reset: false,
    };
    let err = init(&fx.ctx, "v1", &options).unwrap_err();
    assert!(matches!(err, MenuError::SourceNotFound(_)));
    assert_eq!(err.exit_code(), 6);
    assert!(!fx.config().vm_dir("v1").exists());
}

#[test]
fn init_reset_wipes_previous_state() {
    let fx = standalone();
    synchronize(&fx.ctx, "work", SyncOptions::default()).unwrap();
    let options = InitOptions {
        source: None,
        reset: true,
    };
    let report = init(&fx.ctx, "work", &options).unwrap();
    assert!(report.created);
    assert!(!fx.config().manifest_path("work").exists());
    assert!(fx
        .config()
        .templates_dir("work")
        .join(desktop::START_ENTRY_ID)
        .is_file());
}

#[test]
fn template_entries_are_marked_as_inherited() {
    let fx = Fixture::new(vec![
        VmInfo::new("fedora", VmKind::TemplateVM),
        VmInfo::new("v1", VmKind::AppVM).with_template("fedora"),
    ]);
    let config = fx.config().clone();
    fs::create_dir_all(config.templates_dir("fedora")).unwrap();
    fs::write(
        config.templates_dir("fedora").join("a.desktop"),
        "[Desktop Entry]\nName=%VMNAME%: Alpha\n",
    )
    .unwrap();
    let ctx = MenuContext::new(
        config.clone(),
        (*fx.ctx.inventory).clone(),
        CatalogAdapter::from_config(&config),
    );
    let v1 = ctx.inventory.get("v1").unwrap();
    let snapshot = ctx
        .catalog
        .snapshot(v1, ctx.inventory.get("fedora"), &[])
        .unwrap();
    let d = snapshot.descriptors().next().unwrap();
    assert_eq!(d.source_kind, SourceKind::Template);

    let report = synchronize(&ctx, "v1", SyncOptions::default()).unwrap();
    assert_eq!(report.created, vec!["a.desktop"]);
    assert!(fs::read_to_string(config.launcher_path("v1", "a.desktop"))
        .unwrap()
        .contains("Name=v1: Alpha"));
}
