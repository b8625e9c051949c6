use std::path::Path;

use serde::Serialize;

use crate::config::SiteConfig;
use crate::error::{Error, Result, StageFailedDetails};
use crate::utils::command::{self, CapturedOutput};

/// Packager used when no `buildCommand` is configured.
pub const DEFAULT_PACKAGER: &str = "wasm-pack";

// === Build Command Resolution ===

#[derive(Debug, Clone)]
pub enum ResolvedBuildCommand {
    /// Explicit `buildCommand` from dockhand.json
    Configured(String),
    /// Default packager invocation
    Packager(String),
}

impl ResolvedBuildCommand {
    pub fn command(&self) -> &str {
        match self {
            ResolvedBuildCommand::Configured(cmd) => cmd,
            ResolvedBuildCommand::Packager(cmd) => cmd,
        }
    }
}

/// Resolve the build command: an explicit `buildCommand` always wins,
/// otherwise the packager is invoked in release mode for a target without
/// module-loading runtime support.
pub fn resolve_build_command(config: &SiteConfig) -> ResolvedBuildCommand {
    if let Some(cmd) = &config.build_command {
        return ResolvedBuildCommand::Configured(cmd.clone());
    }

    ResolvedBuildCommand::Packager(format!(
        "{} build --release --target no-modules",
        DEFAULT_PACKAGER
    ))
}

// === Public API ===

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    pub command: String,
    pub project_dir: String,
    pub build_command: String,
    /// Artifacts verified to exist after the build, project-relative.
    pub artifacts: Vec<String>,
    #[serde(flatten)]
    pub output: CapturedOutput,
    pub success: bool,
}

/// Run the build stage: invoke the packager in the project directory and
/// verify the expected artifacts exist afterwards.
///
/// Never touches the destination working copy. Publishing is a separate
/// entry point.
pub fn run(project_dir: &Path, config: &SiteConfig) -> Result<BuildOutput> {
    let resolved = resolve_build_command(config);
    let build_cmd = resolved.command().to_string();

    log_status!("build", "Running {} in {}", build_cmd, project_dir.display());
    let out = command::run_shell_in(Some(project_dir), &build_cmd);

    if !out.success {
        return Err(build_error(
            &build_cmd,
            project_dir,
            out.exit_code,
            &out.stderr,
            &out.stdout,
        ));
    }

    // The packager exiting 0 is not enough: publish depends on both module
    // files being present, so check them here where the failure is cheapest.
    let pkg_dir = project_dir.join(&config.pkg_dir);
    let mut artifacts = Vec::new();
    for name in [config.loader_artifact(), config.payload_artifact()] {
        let path = pkg_dir.join(&name);
        if !path.is_file() {
            return Err(Error::build_failed(
                format!(
                    "Build completed but expected artifact is missing: {}",
                    path.display()
                ),
                StageFailedDetails {
                    command: Some(build_cmd.clone()),
                    dir: Some(project_dir.display().to_string()),
                    exit_code: Some(out.exit_code),
                    stderr: None,
                },
            )
            .with_hint(format!(
                "Expected the packager to write {} and {} under {}/",
                config.loader_artifact(),
                config.payload_artifact(),
                config.pkg_dir
            )));
        }
        artifacts.push(
            Path::new(&config.pkg_dir)
                .join(&name)
                .to_string_lossy()
                .to_string(),
        );
    }

    log_status!("build", "Artifacts ready in {}", pkg_dir.display());

    Ok(BuildOutput {
        command: "build.run".to_string(),
        project_dir: project_dir.display().to_string(),
        build_command: build_cmd,
        artifacts,
        output: CapturedOutput::new(out.stdout, out.stderr),
        success: true,
    })
}

/// Format a build failure with context from stderr/stdout.
/// Only includes universal POSIX exit code hints - the packager is
/// swappable and dockhand stays technology-agnostic.
fn build_error(
    build_cmd: &str,
    project_dir: &Path,
    exit_code: i32,
    stderr: &str,
    stdout: &str,
) -> Error {
    // Get useful output (prefer stderr, fall back to stdout)
    let output_text = if stderr.trim().is_empty() { stdout } else { stderr };

    // Last 15 lines for context
    let tail: Vec<&str> = output_text.lines().rev().take(15).collect();
    let output_tail: String = tail.into_iter().rev().collect::<Vec<_>>().join("\n");

    let mut message = format!("Build failed (exit code {})", exit_code);
    if !output_tail.is_empty() {
        message.push_str(": ");
        message.push_str(&output_tail);
    }

    let err = Error::build_failed(
        message,
        StageFailedDetails {
            command: Some(build_cmd.to_string()),
            dir: Some(project_dir.display().to_string()),
            exit_code: Some(exit_code),
            stderr: Some(stderr.to_string()),
        },
    );

    match exit_code {
        127 => err.with_hint(
            "Command not found. Check that the packager and its dependencies are installed and in PATH.",
        ),
        126 => err.with_hint("Permission denied. Check file permissions on the build command."),
        _ => err,
    }
}
