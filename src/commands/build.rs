use clap::Args;
use std::path::PathBuf;

use dockhand::build;
use dockhand::config::SiteConfig;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct BuildArgs {
    /// Project directory containing dockhand.json
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Configuration file override
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: BuildArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<build::BuildOutput> {
    let config = SiteConfig::load(&args.project, args.config.as_deref())?;
    let output = build::run(&args.project, &config)?;
    Ok((output, 0))
}
