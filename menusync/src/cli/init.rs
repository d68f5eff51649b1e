// menusync/src/cli/init.rs
use clap::Args;
use colored::Colorize;
use menusync_common::error::Result;
use menusync_core::{init, InitOptions, MenuContext};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// VM whose menu storage to create
    pub vm: String,

    /// Clone whitelists, artifact records and received templates from this VM
    #[arg(long)]
    pub source: Option<String>,

    /// Delete existing storage for the VM first
    #[arg(long)]
    pub reset: bool,
}

impl InitArgs {
    pub fn run(&self, ctx: &MenuContext) -> Result<()> {
        let options = InitOptions {
            source: self.source.clone(),
            reset: self.reset,
        };
        let report = init(ctx, &self.vm, &options)?;
        if !report.created {
            println!(
                "{} already initialised (use --reset to start over)",
                self.vm.cyan()
            );
            return Ok(());
        }
        match &report.seeded_from {
            Some(src) => println!(
                "{} Initialised {} from {} ({} launchers, {} templates{})",
                "✓".green(),
                self.vm.green(),
                src.cyan(),
                report.records_seeded,
                report.templates_copied,
                if report.whitelist_seeded { ", whitelist" } else { "" }
            ),
            None => println!(
                "{} Initialised {}{}",
                "✓".green(),
                self.vm.green(),
                if report.whitelist_seeded {
                    " (whitelist seeded from template default)"
                } else {
                    ""
                }
            ),
        }
        Ok(())
    }
}
