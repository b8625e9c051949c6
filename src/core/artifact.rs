//! Artifact-set resolution: which files a publish copies, and where to.

use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::error::{Error, Result};

/// One file in the publish set: absolute source path plus the path it takes
/// on relative to the destination working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub source: PathBuf,
    pub dest_rel: PathBuf,
}

/// Resolve the full artifact set for a project: the two built module files
/// (published under the package subdirectory) plus the static assets
/// (published into the destination root).
///
/// Asset entries may be glob patterns; a pattern that matches nothing is an
/// error, since publishing an incomplete set is never wanted.
pub fn resolve_artifact_set(project_dir: &Path, config: &SiteConfig) -> Result<Vec<ArtifactFile>> {
    let mut files = Vec::new();

    let pkg_dir = project_dir.join(&config.pkg_dir);
    for name in [config.loader_artifact(), config.payload_artifact()] {
        files.push(ArtifactFile {
            source: pkg_dir.join(&name),
            dest_rel: Path::new(&config.pkg_dir).join(&name),
        });
    }

    for asset in &config.assets {
        if contains_glob_chars(asset) {
            files.extend(expand_asset_glob(project_dir, asset)?);
        } else {
            files.push(ArtifactFile {
                source: project_dir.join(asset),
                dest_rel: PathBuf::from(asset),
            });
        }
    }

    Ok(files)
}

fn expand_asset_glob(project_dir: &Path, pattern: &str) -> Result<Vec<ArtifactFile>> {
    let absolute = project_dir.join(pattern);
    let absolute = absolute.to_string_lossy();

    let matches: Vec<PathBuf> = glob::glob(&absolute)
        .map_err(|e| {
            Error::validation_invalid_argument(
                "assets",
                format!("Invalid glob pattern '{}': {}", pattern, e),
            )
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    if matches.is_empty() {
        return Err(Error::copy_missing(vec![pattern.to_string()]));
    }

    let mut files = Vec::new();
    for source in matches {
        let dest_rel = source
            .strip_prefix(project_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(source.file_name().unwrap_or_default()));
        files.push(ArtifactFile { source, dest_rel });
    }

    Ok(files)
}

fn contains_glob_chars(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[') || s.contains(']')
}
