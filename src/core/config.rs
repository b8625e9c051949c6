use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Config filename looked up in the project directory.
pub const CONFIG_FILE: &str = "dockhand.json";

/// Environment override for the destination working copy.
pub const DEST_ENV_VAR: &str = "DOCKHAND_DEST";

/// Per-project publication settings, read from `dockhand.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Wasm module name; derives the built artifact filenames
    /// `<name>.js` and `<name>_bg.wasm`.
    pub name: String,

    /// Deployment working copy path. `--dest` and DOCKHAND_DEST take
    /// precedence, so a shared config can be pointed at a scratch checkout.
    #[serde(default)]
    pub dest: Option<String>,

    /// Static files copied from the project root into the destination root.
    /// Entries may be glob patterns.
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    /// Packager output directory, and the destination subdirectory the built
    /// artifacts are published under.
    #[serde(default = "default_pkg_dir")]
    pub pkg_dir: String,

    /// Overrides the default packager invocation; run through the shell.
    #[serde(default)]
    pub build_command: Option<String>,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

fn default_assets() -> Vec<String> {
    vec![
        "index.html".to_string(),
        "style.css".to_string(),
        "index.js".to_string(),
    ]
}

fn default_pkg_dir() -> String {
    "pkg".to_string()
}

fn default_commit_message() -> String {
    "update".to_string()
}

impl SiteConfig {
    /// Load config from `config_path`, or `<project_dir>/dockhand.json`.
    pub fn load(project_dir: &Path, config_path: Option<&Path>) -> Result<SiteConfig> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dir.join(CONFIG_FILE));

        let raw = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.display().to_string())
            } else {
                Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
            }
        })?;

        let config: SiteConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "name",
                Some(self.name.clone()),
                "must not be empty",
            ));
        }
        if self.pkg_dir.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "pkgDir",
                Some(self.pkg_dir.clone()),
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Resolve the destination working copy: `--dest` flag beats the
    /// DOCKHAND_DEST environment variable, which beats the config value.
    pub fn resolve_dest(&self, flag: Option<&str>) -> Result<PathBuf> {
        let raw = flag
            .map(str::to_string)
            .or_else(|| env::var(DEST_ENV_VAR).ok().filter(|v| !v.trim().is_empty()))
            .or_else(|| self.dest.clone())
            .ok_or_else(|| {
                Error::config_missing_key("dest").with_hint(
                    "Set \"dest\" in dockhand.json, pass --dest, or export DOCKHAND_DEST",
                )
            })?;

        Ok(PathBuf::from(shellexpand::tilde(&raw).to_string()))
    }

    /// Loader script emitted by the packager.
    pub fn loader_artifact(&self) -> String {
        format!("{}.js", self.name)
    }

    /// Compiled module payload emitted by the packager.
    pub fn payload_artifact(&self) -> String {
        format!("{}_bg.wasm", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, json: &str) {
        fs::write(dir.join(CONFIG_FILE), json).unwrap();
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), r#"{"name": "draw"}"#);

        let config = SiteConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.name, "draw");
        assert_eq!(config.pkg_dir, "pkg");
        assert_eq!(config.commit_message, "update");
        assert_eq!(config.assets, vec!["index.html", "style.css", "index.js"]);
        assert_eq!(config.loader_artifact(), "draw.js");
        assert_eq!(config.payload_artifact(), "draw_bg.wasm");
    }

    #[test]
    fn camel_case_keys_are_honored() {
        let dir = TempDir::new().unwrap();
        write_config(
            dir.path(),
            r#"{
                "name": "viewer",
                "dest": "/srv/site",
                "pkgDir": "dist",
                "buildCommand": "make bundle",
                "commitMessage": "deploy",
                "assets": ["index.html"]
            }"#,
        );

        let config = SiteConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.pkg_dir, "dist");
        assert_eq!(config.build_command.as_deref(), Some("make bundle"));
        assert_eq!(config.commit_message, "deploy");
        assert_eq!(config.dest.as_deref(), Some("/srv/site"));
    }

    #[test]
    fn missing_config_file_is_config_not_found() {
        let dir = TempDir::new().unwrap();
        let err = SiteConfig::load(dir.path(), None).unwrap_err();
        assert_eq!(err.code.as_str(), "config.not_found");
    }

    #[test]
    fn malformed_json_is_config_invalid_json() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), "{not json");
        let err = SiteConfig::load(dir.path(), None).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
    }

    #[test]
    fn empty_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), r#"{"name": "  "}"#);
        let err = SiteConfig::load(dir.path(), None).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    // Single test so nothing else races on the process-global env var.
    #[test]
    fn dest_resolution_precedence() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), r#"{"name": "draw"}"#);
        let bare = SiteConfig::load(dir.path(), None).unwrap();
        let mut config = bare.clone();
        config.dest = Some("/from/config".to_string());

        env::remove_var(DEST_ENV_VAR);

        // nothing configured anywhere
        let err = bare.resolve_dest(None).unwrap_err();
        assert_eq!(err.code.as_str(), "config.missing_key");
        assert!(!err.hints.is_empty());

        // config value alone
        assert_eq!(
            config.resolve_dest(None).unwrap(),
            PathBuf::from("/from/config")
        );

        // env var beats config
        env::set_var(DEST_ENV_VAR, "/from/env");
        assert_eq!(
            config.resolve_dest(None).unwrap(),
            PathBuf::from("/from/env")
        );

        // flag beats env
        assert_eq!(
            config.resolve_dest(Some("/from/flag")).unwrap(),
            PathBuf::from("/from/flag")
        );

        env::remove_var(DEST_ENV_VAR);
    }
}
