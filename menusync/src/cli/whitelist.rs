// menusync/src/cli/whitelist.rs
use clap::Args;
use colored::Colorize;
use menusync_common::error::Result;
use menusync_core::{compute_effective, read_list_input, MenuContext, WhitelistStore};
use tracing::info;

#[derive(Args, Debug)]
pub struct GetWhitelist {
    pub vm: String,

    /// Print the resolved set (explicit, inherited or full catalog)
    #[arg(long, conflicts_with = "default")]
    pub effective: bool,

    /// Print the template's default whitelist
    #[arg(long)]
    pub default: bool,
}

impl GetWhitelist {
    pub fn run(&self, ctx: &MenuContext) -> Result<()> {
        let ids = if self.effective {
            let set = compute_effective(ctx, &self.vm)?;
            info!("{} uses its {}", self.vm, set.origin);
            set.ids
        } else {
            let store = WhitelistStore::new(ctx);
            let list = if self.default {
                store.get_default(&self.vm)?
            } else {
                store.get(&self.vm)?
            };
            list.map(|l| l.into_vec()).unwrap_or_default()
        };
        for id in ids {
            println!("{id}");
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct SetWhitelist {
    pub vm: String,

    /// File with one identifier per line, or `-` for stdin
    pub source: String,
}

impl SetWhitelist {
    pub fn run(&self, ctx: &MenuContext, default: bool) -> Result<()> {
        let list = read_list_input(&self.source)?;
        let store = WhitelistStore::new(ctx);
        let update = if default {
            store.set_default(&self.vm, list)?
        } else {
            store.set(&self.vm, list)?
        };
        if !update.validated {
            eprintln!(
                "{} {} could not be queried; {} entries stored without validation",
                "Warning:".yellow().bold(),
                self.vm,
                update.whitelist.len()
            );
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct UnsetWhitelist {
    pub vm: String,

    /// Remove the template's default whitelist instead
    #[arg(long)]
    pub default: bool,
}

impl UnsetWhitelist {
    pub fn run(&self, ctx: &MenuContext) -> Result<()> {
        let store = WhitelistStore::new(ctx);
        let removed = if self.default {
            store.clear_default(&self.vm)?
        } else {
            store.clear(&self.vm)?
        };
        if !removed {
            println!("{} had no stored whitelist", self.vm.cyan());
        }
        Ok(())
    }
}
