//! Command execution primitives with consistent error handling.

use std::path::Path;
use std::process::{Command, Output};

use serde::Serialize;

/// Result of running an external process to completion.
///
/// A spawn failure is folded into a failed result (exit code -1, error text
/// in stderr) rather than a separate error path, so callers always have one
/// shape to inspect.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    fn from_output(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }

    fn spawn_failure(error: std::io::Error) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Command error: {}", error),
            success: false,
            exit_code: -1,
        }
    }
}

/// Run a command line through the shell, optionally in a working directory.
///
/// Shell execution is required for configured build commands: they chain
/// steps with `&&`, redirect output, and call scripts, which direct
/// execution cannot handle.
pub fn run_shell_in(dir: Option<&Path>, command_line: &str) -> CommandOutput {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);

    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    match cmd.output() {
        Ok(output) => CommandOutput::from_output(output),
        Err(e) => CommandOutput::spawn_failure(e),
    }
}

/// Check if a command succeeds without capturing output.
pub fn succeeded(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

/// Captured output from command execution.
/// Reusable primitive for any result payload that carries process output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapturedOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(stdout: String, stderr: String) -> Self {
        Self { stdout, stderr }
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_shell_captures_stdout() {
        let out = run_shell_in(None, "echo hello");
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn run_shell_reports_exit_code() {
        let out = run_shell_in(None, "exit 3");
        assert!(!out.success);
        assert_eq!(out.exit_code, 3);
    }

    #[test]
    fn run_shell_respects_working_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = run_shell_in(Some(dir.path()), "pwd");
        let reported = std::fs::canonicalize(out.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn spawn_failure_is_folded_into_result() {
        let out = run_shell_in(Some(Path::new("/nonexistent_dockhand_dir")), "true");
        assert!(!out.success);
        assert_eq!(out.exit_code, -1);
        assert!(out.stderr.contains("Command error"));
    }

    #[test]
    fn error_text_prefers_stderr() {
        let output = Command::new("sh")
            .args(["-c", "echo out; echo err >&2"])
            .output()
            .unwrap();
        assert_eq!(error_text(&output), "err");
    }

    #[test]
    fn error_text_falls_back_to_stdout() {
        let output = Command::new("sh").args(["-c", "echo out"]).output().unwrap();
        assert_eq!(error_text(&output), "out");
    }

    #[test]
    fn succeeded_detects_missing_program() {
        assert!(!succeeded("nonexistent_command_xyz", &[]));
        assert!(succeeded("sh", &["-c", "true"]));
    }
}
