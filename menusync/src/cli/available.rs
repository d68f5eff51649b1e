// menusync/src/cli/available.rs
use clap::Args;
use menusync_common::error::{MenuError, Result};
use menusync_core::{list_available, ListingFormat, MenuContext};

#[derive(Args, Debug)]
pub struct GetAvailable {
    pub vm: String,

    /// Acknowledge that the output format may change between releases
    #[arg(long = "i-understand-format-is-unstable")]
    pub unstable_ack: bool,

    /// Extra desktop-entry keys to print as `|`-separated columns
    #[arg(long = "file-field", value_name = "FIELD")]
    pub file_fields: Vec<String>,

    /// List entries as if the VM were based on this template
    #[arg(long)]
    pub template: Option<String>,

    /// Pin the output format version
    #[arg(long, value_name = "N")]
    pub format_version: Option<u32>,
}

impl GetAvailable {
    pub fn run(&self, ctx: &MenuContext) -> Result<()> {
        if !self.unstable_ack {
            return Err(MenuError::UnstableFormat(
                "get-available output may change; pass --i-understand-format-is-unstable"
                    .to_string(),
            ));
        }
        let format = ListingFormat::from_version(self.format_version)?;
        for line in list_available(
            ctx,
            &self.vm,
            self.template.as_deref(),
            &self.file_fields,
            format,
        )? {
            println!("{line}");
        }
        Ok(())
    }
}
