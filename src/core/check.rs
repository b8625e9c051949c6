//! Read-only environment diagnosis: reports what would make `build` or
//! `publish` fail, without changing anything.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::artifact;
use crate::build::DEFAULT_PACKAGER;
use crate::config::SiteConfig;
use crate::error::Result;
use crate::git;
use crate::utils::command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckSeverity {
    Info,
    Warning,
    Error,
}

impl CheckSeverity {
    fn sort_key(&self) -> u8 {
        match self {
            CheckSeverity::Error => 0,
            CheckSeverity::Warning => 1,
            CheckSeverity::Info => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIssue {
    pub severity: CheckSeverity,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub checks_run: usize,
    pub issues: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub command: String,
    pub summary: CheckSummary,
    pub issues: Vec<CheckIssue>,
}

/// Exit code policy: error issues fail the command, warnings do not.
pub fn exit_code(report: &CheckReport) -> i32 {
    let has_errors = report
        .issues
        .iter()
        .any(|i| i.severity == CheckSeverity::Error);
    if has_errors {
        1
    } else {
        0
    }
}

/// Diagnose a project and its destination.
pub fn run(
    project_dir: &Path,
    config_path: Option<&Path>,
    dest_flag: Option<&str>,
) -> Result<CheckReport> {
    let mut checker = Checker::new("check.run");

    let config = match SiteConfig::load(project_dir, config_path) {
        Ok(config) => config,
        Err(err) => {
            // Nothing else is checkable without a config.
            checker.check(|| {
                Some(CheckIssue {
                    severity: CheckSeverity::Error,
                    code: "CONFIG_INVALID".to_string(),
                    message: err.message.clone(),
                    details: Some(err.details.clone()),
                })
            });
            return Ok(checker.finish());
        }
    };
    checker.checks_run += 1;

    checker.check_packager(&config);
    checker.check_artifacts(project_dir, &config);
    checker.check_dest(&config, dest_flag);

    Ok(checker.finish())
}

struct Checker {
    command: String,
    checks_run: usize,
    issues: Vec<CheckIssue>,
}

impl Checker {
    fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            checks_run: 0,
            issues: Vec::new(),
        }
    }

    fn check<F>(&mut self, f: F)
    where
        F: FnOnce() -> Option<CheckIssue>,
    {
        self.checks_run += 1;
        if let Some(issue) = f() {
            self.issues.push(issue);
        }
    }

    fn check_packager(&mut self, config: &SiteConfig) {
        // An explicit buildCommand owns its own toolchain; only the default
        // packager invocation is probed.
        if config.build_command.is_some() {
            return;
        }

        self.check(|| {
            if command::succeeded(DEFAULT_PACKAGER, &["--version"]) {
                None
            } else {
                Some(CheckIssue {
                    severity: CheckSeverity::Error,
                    code: "PACKAGER_NOT_FOUND".to_string(),
                    message: format!("{} is not invocable", DEFAULT_PACKAGER),
                    details: None,
                })
            }
        });
    }

    fn check_artifacts(&mut self, project_dir: &Path, config: &SiteConfig) {
        let files = match artifact::resolve_artifact_set(project_dir, config) {
            Ok(files) => files,
            Err(err) => {
                self.check(|| {
                    Some(CheckIssue {
                        severity: CheckSeverity::Error,
                        code: "ARTIFACT_SET_INVALID".to_string(),
                        message: err.message.clone(),
                        details: Some(err.details.clone()),
                    })
                });
                return;
            }
        };

        for file in files {
            self.check(|| {
                if file.source.is_file() {
                    return None;
                }

                // Module artifacts appear after a build; their absence is
                // expected state, not a broken project.
                let is_module_artifact = file.dest_rel.starts_with(&config.pkg_dir);
                Some(CheckIssue {
                    severity: if is_module_artifact {
                        CheckSeverity::Warning
                    } else {
                        CheckSeverity::Error
                    },
                    code: if is_module_artifact {
                        "ARTIFACT_NOT_BUILT".to_string()
                    } else {
                        "ASSET_MISSING".to_string()
                    },
                    message: format!("Missing: {}", file.source.display()),
                    details: None,
                })
            });
        }
    }

    fn check_dest(&mut self, config: &SiteConfig, dest_flag: Option<&str>) {
        let dest = match config.resolve_dest(dest_flag) {
            Ok(dest) => dest,
            Err(err) => {
                self.check(|| {
                    Some(CheckIssue {
                        severity: CheckSeverity::Error,
                        code: "DEST_NOT_CONFIGURED".to_string(),
                        message: err.message.clone(),
                        details: Some(err.details.clone()),
                    })
                });
                return;
            }
        };

        let mut dest_exists = false;
        self.check(|| {
            if dest.is_dir() {
                dest_exists = true;
                None
            } else {
                Some(CheckIssue {
                    severity: CheckSeverity::Error,
                    code: "DEST_MISSING".to_string(),
                    message: format!("Destination does not exist: {}", dest.display()),
                    details: None,
                })
            }
        });
        if !dest_exists {
            return;
        }

        let mut is_workdir = false;
        self.check(|| {
            if git::is_workdir(&dest) {
                is_workdir = true;
                None
            } else {
                Some(CheckIssue {
                    severity: CheckSeverity::Error,
                    code: "DEST_NOT_WORKDIR".to_string(),
                    message: format!("Destination is not a git working copy: {}", dest.display()),
                    details: None,
                })
            }
        });
        if !is_workdir {
            return;
        }

        self.check(|| match git::upstream_branch(&dest) {
            Some(_) => None,
            None => Some(CheckIssue {
                severity: CheckSeverity::Warning,
                code: "DEST_NO_UPSTREAM".to_string(),
                message: "Destination branch has no upstream; push will fail".to_string(),
                details: None,
            }),
        });
    }

    fn finish(mut self) -> CheckReport {
        let mut counts = BTreeMap::new();
        for (key, severity) in [
            ("error", CheckSeverity::Error),
            ("warning", CheckSeverity::Warning),
            ("info", CheckSeverity::Info),
        ] {
            counts.insert(
                key.to_string(),
                self.issues.iter().filter(|i| i.severity == severity).count(),
            );
        }

        self.issues.sort_by(|a, b| {
            let by_severity = a.severity.sort_key().cmp(&b.severity.sort_key());
            if by_severity != Ordering::Equal {
                return by_severity;
            }
            a.code.cmp(&b.code)
        });

        CheckReport {
            command: self.command.clone(),
            summary: CheckSummary {
                checks_run: self.checks_run,
                issues: counts,
            },
            issues: self.issues,
        }
    }
}
