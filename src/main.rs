use clap::{Parser, Subcommand};

mod commands;
mod output;
mod tty;

use commands::{build, check, publish, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "dockhand")]
#[command(version = VERSION)]
#[command(about = "CLI for building and publishing WebAssembly site bundles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the wasm bundle with the configured packager
    Build(build::BuildArgs),
    /// Copy built artifacts and page assets into the deployment working copy, commit, and push
    Publish(publish::PublishArgs),
    /// Build only; publishing stays a separate step
    All(build::BuildArgs),
    /// Diagnose configuration and environment without changing anything
    Check(check::CheckArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
