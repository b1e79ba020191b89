// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `IssueTracker` implementation that shells out to the `bd` binary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mailbeads_config::model::BeadsConfig;
use mailbeads_core::{Issue, IssueTracker, MailbeadsError, NewIssue};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::args;

/// Walk up from `start` to the first `.beads/beads.db`.
pub fn discover_beads_db(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(".beads").join("beads.db"))
        .find(|candidate| candidate.is_file())
}

/// Resolve a binary name against `PATH`, or check an explicit path.
pub fn resolve_binary(binary: &str) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|full| full.is_file())
}

/// Issue tracker backed by the `bd` CLI.
pub struct BeadsCli {
    binary: String,
    labels: Vec<String>,
    db_path: Option<PathBuf>,
}

impl BeadsCli {
    /// Create a tracker for the configured binary.
    ///
    /// `start` is where the `.beads/beads.db` lookup begins; when found every
    /// call is prefixed with `--db <path>`.
    pub fn new(config: &BeadsConfig, start: &Path) -> Self {
        let db_path = discover_beads_db(start);
        debug!(binary = %config.binary, db = ?db_path, "bd tracker configured");
        Self {
            binary: config.binary.clone(),
            labels: config.labels.clone(),
            db_path,
        }
    }

    /// Full argument list including the `--db` prefix.
    fn full_args(&self, args: Vec<String>) -> Vec<String> {
        match &self.db_path {
            Some(db) => {
                let mut full = vec!["--db".to_string(), db.display().to_string()];
                full.extend(args);
                full
            }
            None => args,
        }
    }

    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>, MailbeadsError> {
        let subcommand = args.first().cloned().unwrap_or_default();
        let full = self.full_args(args);
        debug!(binary = %self.binary, args = ?full, "running bd");

        let output = tokio::process::Command::new(&self.binary)
            .args(&full)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MailbeadsError::TrackerUnavailable(format!(
                        "{} not found on PATH",
                        self.binary
                    ))
                } else {
                    MailbeadsError::Tracker {
                        message: format!("failed to execute {} {subcommand}: {e}", self.binary),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(MailbeadsError::tracker(format!(
                "bd {subcommand}: {stderr}"
            )));
        }
        Ok(output.stdout)
    }

    async fn run_json<T: DeserializeOwned>(&self, args: Vec<String>) -> Result<T, MailbeadsError> {
        let subcommand = args.first().cloned().unwrap_or_default();
        let out = self.run(args).await?;
        serde_json::from_slice(&out).map_err(|e| MailbeadsError::Tracker {
            message: format!("parse bd {subcommand} output: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Parse `bd show` output: an array (possibly empty) or a single object.
pub fn parse_show(out: &[u8]) -> Result<Option<Issue>, MailbeadsError> {
    match serde_json::from_slice::<Vec<Issue>>(out) {
        Ok(issues) => Ok(issues.into_iter().next()),
        Err(array_err) => serde_json::from_slice::<Issue>(out)
            .map(Some)
            .map_err(|_| MailbeadsError::Tracker {
                message: format!("parse bd show output: {array_err}"),
                source: Some(Box::new(array_err)),
            }),
    }
}

#[async_trait]
impl IssueTracker for BeadsCli {
    async fn is_available(&self) -> bool {
        resolve_binary(&self.binary).is_some()
    }

    async fn create(&self, issue: &NewIssue) -> Result<Issue, MailbeadsError> {
        self.run_json(args::create(issue, &self.labels)).await
    }

    async fn update(
        &self,
        id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), MailbeadsError> {
        self.run(args::update(id, fields)).await.map(drop)
    }

    async fn close(&self, id: &str, reason: &str) -> Result<(), MailbeadsError> {
        self.run(args::close(id, reason)).await.map(drop)
    }

    async fn show(&self, id: &str) -> Result<Option<Issue>, MailbeadsError> {
        let out = self.run(args::show(id)).await?;
        parse_show(&out)
    }

    async fn list(
        &self,
        labels: &[String],
        status: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Issue>, MailbeadsError> {
        self.run_json(args::list(labels, status, limit)).await
    }

    async fn ready(&self, labels: &[String], limit: u32) -> Result<Vec<Issue>, MailbeadsError> {
        self.run_json(args::ready(labels, limit)).await
    }

    async fn add_dependency(&self, child: &str, parent: &str) -> Result<(), MailbeadsError> {
        self.run(args::add_dependency(child, parent)).await.map(drop)
    }

    async fn comment(&self, id: &str, text: &str) -> Result<(), MailbeadsError> {
        self.run(args::comment(id, text)).await.map(drop)
    }
}
