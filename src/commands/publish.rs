use clap::Args;
use std::path::PathBuf;

use dockhand::config::SiteConfig;
use dockhand::publish;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct PublishArgs {
    /// Project directory containing dockhand.json
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Configuration file override
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Destination working copy (beats DOCKHAND_DEST and the config value)
    #[arg(long)]
    pub dest: Option<String>,
}

pub fn run(
    args: PublishArgs,
    _global: &crate::commands::GlobalArgs,
) -> CmdResult<publish::PublishOutput> {
    let config = SiteConfig::load(&args.project, args.config.as_deref())?;
    let dest = config.resolve_dest(args.dest.as_deref())?;
    let output = publish::run(&args.project, &config, &dest)?;
    Ok((output, 0))
}
