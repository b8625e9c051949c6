//! Git primitives for the destination working copy.
//!
//! Every operation shells out to the `git` client; a non-zero git exit is
//! reported in the returned [`GitOutput`] rather than as an `Err`, so the
//! publish stage can decide which taxonomy bucket the failure belongs to.

use std::path::Path;
use std::process::{Command, Output};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::command;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitOutput {
    pub action: String,
    pub success: bool,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl GitOutput {
    fn from_output(action: &str, output: Output) -> Self {
        Self {
            action: action.to_string(),
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

fn execute_git(path: &Path, args: &[&str]) -> Result<Output> {
    Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .map_err(|e| {
            Error::git_command_failed(format!(
                "Failed to run git {}: {}",
                args.first().unwrap_or(&""),
                e
            ))
        })
}

/// Check if a path is inside a git working copy.
pub fn is_workdir(path: &Path) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(path)
        .args(["rev-parse", "--git-dir"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check if a working copy has staged, unstaged, or untracked changes.
pub fn has_changes(path: &Path) -> Result<bool> {
    let output = execute_git(path, &["status", "--porcelain=v1"])?;
    if !output.status.success() {
        return Err(Error::git_command_failed(format!(
            "git status failed: {}",
            command::error_text(&output)
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(!stdout.trim().is_empty())
}

/// Stage all changes in the working copy.
pub fn add_all(path: &Path) -> Result<GitOutput> {
    let output = execute_git(path, &["add", "-A"])?;
    Ok(GitOutput::from_output("add", output))
}

/// Commit staged changes with the given message.
pub fn commit(path: &Path, message: &str) -> Result<GitOutput> {
    let output = execute_git(path, &["commit", "-m", message])?;
    Ok(GitOutput::from_output("commit", output))
}

/// Push the current branch to its configured upstream.
pub fn push(path: &Path) -> Result<GitOutput> {
    let output = execute_git(path, &["push"])?;
    Ok(GitOutput::from_output("push", output))
}

/// Upstream tracking ref of the current branch, if one is configured.
pub fn upstream_branch(path: &Path) -> Option<String> {
    let output = execute_git(path, &["rev-parse", "--abbrev-ref", "@{u}"]).ok()?;
    if !output.status.success() {
        return None;
    }

    let upstream = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if upstream.is_empty() {
        None
    } else {
        Some(upstream)
    }
}
