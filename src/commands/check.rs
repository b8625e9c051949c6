use clap::Args;
use std::path::PathBuf;

use dockhand::check;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct CheckArgs {
    /// Project directory containing dockhand.json
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Configuration file override
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Destination working copy to diagnose instead of the configured one
    #[arg(long)]
    pub dest: Option<String>,
}

pub fn run(args: CheckArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<check::CheckReport> {
    let report = check::run(&args.project, args.config.as_deref(), args.dest.as_deref())?;
    let exit_code = check::exit_code(&report);
    Ok((report, exit_code))
}
