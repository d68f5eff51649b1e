// menusync/src/cli/remove.rs
use clap::Args;
use colored::Colorize;
use menusync_common::error::Result;
use menusync_core::{list_storage_vms, remove, MenuContext};

use crate::cli::for_each_target;

#[derive(Args, Debug)]
pub struct Remove {
    /// VMs whose menu storage to delete; they need not exist any more
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub vms: Vec<String>,

    /// Remove storage of every VM found under the data root
    #[arg(long)]
    pub all: bool,
}

impl Remove {
    pub fn run(&self, ctx: &MenuContext) -> Result<()> {
        let targets = if self.all {
            list_storage_vms(&ctx.config)?
        } else {
            self.vms.clone()
        };
        for_each_target(&targets, |vm| {
            let report = remove(ctx, vm)?;
            if report.existed {
                println!(
                    "{} Removed {} ({} files, {})",
                    "✓".green(),
                    vm.green(),
                    report.files_removed,
                    format_size(report.bytes_removed)
                );
            } else {
                println!("{} has no menu storage", vm.cyan());
            }
            Ok(())
        })
    }
}

fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if size >= GB {
        format!("{:.1}GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1}MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1}KB", size as f64 / KB as f64)
    } else {
        format!("{size}B")
    }
}
