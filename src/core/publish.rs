//! Publish stage: copy the artifact set into the destination working copy,
//! commit, and push.
//!
//! Strictly sequential; the first failing step aborts the rest. Completed
//! copies are not rolled back - the next successful publish overwrites them.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::artifact::{self, ArtifactFile};
use crate::config::SiteConfig;
use crate::error::{Error, ErrorCode, Result, StageFailedDetails};
use crate::git::{self, GitOutput};
use crate::utils::checksum;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopiedFile {
    pub source: String,
    pub dest: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutput {
    pub command: String,
    pub dest: String,
    pub copied: Vec<CopiedFile>,
    /// False when the working copy was already up to date and the commit
    /// was skipped as a no-op.
    pub committed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<GitOutput>,
    pub push: GitOutput,
}

/// Run the publish stage against a destination working copy.
///
/// Order is the contract: preflight, then all copies, then commit, then
/// push. A missing source file fails before any file is copied or any git
/// operation runs.
pub fn run(project_dir: &Path, config: &SiteConfig, dest: &Path) -> Result<PublishOutput> {
    let files = artifact::resolve_artifact_set(project_dir, config)?;

    preflight(&files, config)?;

    if !dest.is_dir() {
        return Err(Error::new(
            ErrorCode::CopyFailed,
            format!("Destination directory does not exist: {}", dest.display()),
            serde_json::json!({ "dest": dest.display().to_string() }),
        )
        .with_hint("Clone or create the deployment working copy before publishing"));
    }

    if !git::is_workdir(dest) {
        return Err(Error::git_command_failed(format!(
            "Destination is not a git working copy: {}",
            dest.display()
        ))
        .with_hint("Publishing commits and pushes the destination; point \"dest\" at a checkout"));
    }

    let mut copied = Vec::with_capacity(files.len());
    for file in &files {
        copied.push(copy_file(file, dest)?);
    }

    let stage = git::add_all(dest)?;
    if !stage.success {
        return Err(Error::commit_failed(
            format!("git add failed: {}", stage.stderr.trim()),
            StageFailedDetails {
                command: Some("git add -A".to_string()),
                dir: Some(dest.display().to_string()),
                exit_code: Some(stage.exit_code),
                stderr: Some(stage.stderr),
            },
        ));
    }

    let (committed, commit) = if git::has_changes(dest)? {
        let out = git::commit(dest, &config.commit_message)?;
        if !out.success {
            return Err(Error::commit_failed(
                format!("git commit failed: {}", out.stderr.trim()),
                StageFailedDetails {
                    command: Some(format!("git commit -m {:?}", config.commit_message)),
                    dir: Some(dest.display().to_string()),
                    exit_code: Some(out.exit_code),
                    stderr: Some(out.stderr),
                },
            )
            .with_hint("A committer identity may be missing: git config user.name / user.email"));
        }
        log_status!("publish", "Committed \"{}\" in {}", config.commit_message, dest.display());
        (true, Some(out))
    } else {
        log_status!("publish", "Nothing to commit, working tree clean");
        (false, None)
    };

    let push = git::push(dest)?;
    if !push.success {
        return Err(Error::push_failed(
            format!("git push failed: {}", push.stderr.trim()),
            StageFailedDetails {
                command: Some("git push".to_string()),
                dir: Some(dest.display().to_string()),
                exit_code: Some(push.exit_code),
                stderr: Some(push.stderr),
            },
        )
        .with_hint("Check that the current branch has an upstream and the remote is reachable")
        .with_retryable(true));
    }

    log_status!("publish", "Pushed {}", dest.display());

    Ok(PublishOutput {
        command: "publish.run".to_string(),
        dest: dest.display().to_string(),
        copied,
        committed,
        commit,
        push,
    })
}

/// Every source must exist before anything is copied or committed, so a
/// broken set can never end up half-published.
fn preflight(files: &[ArtifactFile], config: &SiteConfig) -> Result<()> {
    let missing: Vec<String> = files
        .iter()
        .filter(|f| !f.source.is_file())
        .map(|f| f.source.display().to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let module_missing = files
        .iter()
        .filter(|f| !f.source.is_file())
        .any(|f| f.dest_rel.starts_with(&config.pkg_dir));

    let mut err = Error::copy_missing(missing);
    if module_missing {
        err = err.with_hint("Run 'dockhand build' to produce the module artifacts");
    }
    Err(err)
}

fn copy_file(file: &ArtifactFile, dest_root: &Path) -> Result<CopiedFile> {
    let target = dest_root.join(&file.dest_rel);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::copy_failed(target.display().to_string(), e.to_string())
        })?;
    }

    let bytes = fs::copy(&file.source, &target)
        .map_err(|e| Error::copy_failed(file.source.display().to_string(), e.to_string()))?;

    // Byte-for-byte verification: digest both sides of the copy.
    let expected = checksum::sha256_file(&file.source)?;
    let actual = checksum::sha256_file(&target)?;
    if expected != actual {
        return Err(Error::copy_failed(
            file.source.display().to_string(),
            format!("digest mismatch after copy ({} != {})", expected, actual),
        ));
    }

    log_status!(
        "publish",
        "Copied {} -> {}",
        file.source.display(),
        target.display()
    );

    Ok(CopiedFile {
        source: file.source.display().to_string(),
        dest: target.display().to_string(),
        bytes,
        sha256: actual,
    })
}
