// menusync/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use menusync_common::error::{MenuError, Result};
use menusync_core::MenuContext;

pub mod available;
pub mod init;
pub mod remove;
pub mod status;
pub mod sync;
pub mod whitelist;

use crate::cli::available::GetAvailable;
use crate::cli::init::InitArgs;
use crate::cli::remove::Remove;
use crate::cli::sync::SyncArgs;
use crate::cli::whitelist::{GetWhitelist, SetWhitelist, UnsetWhitelist};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "menusync", bin_name = "menusync")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a VM's menu storage, optionally cloned from another VM
    Init(InitArgs),
    /// Initialise if needed and synchronize launchers
    Create(SyncArgs),
    /// Synchronize launchers; templates also update their dependents
    Update(SyncArgs),
    /// Delete all launchers and whitelists of a VM
    Remove(Remove),
    /// Print a VM's whitelist, one identifier per line
    GetWhitelist(GetWhitelist),
    /// Replace a VM's whitelist from a file or `-` for stdin
    SetWhitelist(SetWhitelist),
    /// Replace a template's default whitelist from a file or `-` for stdin
    SetDefaultWhitelist(SetWhitelist),
    /// Drop a stored whitelist so the VM inherits again
    UnsetWhitelist(UnsetWhitelist),
    /// List the applications a VM offers
    GetAvailable(GetAvailable),
}

impl Command {
    pub async fn run(&self, ctx: MenuContext) -> Result<()> {
        match self {
            Self::Init(command) => command.run(&ctx),
            Self::Create(command) => command.run_create(ctx).await,
            Self::Update(command) => command.run_update(ctx).await,
            Self::Remove(command) => command.run(&ctx),
            Self::GetWhitelist(command) => command.run(&ctx),
            Self::SetWhitelist(command) => command.run(&ctx, false),
            Self::SetDefaultWhitelist(command) => command.run(&ctx, true),
            Self::UnsetWhitelist(command) => command.run(&ctx),
            Self::GetAvailable(command) => command.run(&ctx),
        }
    }
}

/// Runs `op` for each target; every target is attempted and the first
/// failure is returned.
pub(crate) fn for_each_target<F>(targets: &[String], mut op: F) -> Result<()>
where
    F: FnMut(&str) -> Result<()>,
{
    let mut first_err: Option<MenuError> = None;
    for target in targets {
        if let Err(e) = op(target) {
            tracing::error!("✖ {}: {}", target, e);
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
