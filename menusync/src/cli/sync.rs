// menusync/src/cli/sync.rs
use clap::Args;
use colored::Colorize;
use menusync_common::error::{MenuError, Result};
use menusync_common::report::SyncReport;
use menusync_core::{init, synchronize, update, InitOptions, MenuContext, SyncOptions, UpdateOutcome};
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::cli::{for_each_target, status};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// VMs to process
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub vms: Vec<String>,

    /// Process every VM in the inventory
    #[arg(long)]
    pub all: bool,

    /// Regenerate launchers even when they look current
    #[arg(long)]
    pub force: bool,
}

impl SyncArgs {
    fn options(&self) -> SyncOptions {
        SyncOptions { force: self.force }
    }

    pub async fn run_create(&self, ctx: MenuContext) -> Result<()> {
        let targets = if self.all {
            ctx.inventory.names().map(str::to_string).collect()
        } else {
            self.vms.clone()
        };
        for_each_target(&targets, |vm| {
            init(&ctx, vm, &InitOptions::default())?;
            let report = synchronize(&ctx, vm, self.options())?;
            print_sync_report(&report);
            report.into_result().map(|_| ())
        })
    }

    pub async fn run_update(&self, ctx: MenuContext) -> Result<()> {
        let targets = if self.all {
            cascade_roots(&ctx)
        } else {
            self.vms.clone()
        };
        let mut first_err: Option<MenuError> = None;
        for vm in targets {
            if let Err(e) = self.update_one(&ctx, vm.clone()).await {
                error!("✖ {}: {}", vm, e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn update_one(&self, ctx: &MenuContext, vm: String) -> Result<()> {
        let (event_tx, event_rx) = broadcast::channel(256);
        let status_handle = tokio::spawn(status::handle_events(event_rx));

        let task_ctx = ctx.clone();
        let options = self.options();
        let outcome = tokio::task::spawn_blocking(move || {
            update(&task_ctx, &vm, options, Some(event_tx))
        })
        .await
        .map_err(|e| MenuError::Generic(format!("update task failed: {e}")))?;

        if let Err(e) = status_handle.await {
            debug!("Status printer ended abnormally: {}", e);
        }

        let outcome = outcome?;
        match &outcome {
            UpdateOutcome::Single(report) => print_sync_report(report),
            UpdateOutcome::Cascade(report) => status::print_cascade_summary(report),
        }
        outcome.into_result().map(|_| ())
    }
}

/// With `--all`, dependents are reached through their template's cascade.
fn cascade_roots(ctx: &MenuContext) -> Vec<String> {
    ctx.inventory
        .iter()
        .filter(|vm| {
            !vm.template
                .as_deref()
                .and_then(|t| ctx.inventory.get(t))
                .is_some_and(|t| t.is_template())
        })
        .map(|vm| vm.name.clone())
        .collect()
}

pub(crate) fn print_sync_report(report: &SyncReport) {
    if report.is_success() {
        println!("{} {}: {}", "✓".green(), report.vm.green(), report.summary());
    } else {
        println!("{} {}: {}", "✗".red(), report.vm.yellow(), report.summary());
        for (id, reason) in &report.failed {
            println!("    {} {}", id.red(), reason);
        }
    }
}
