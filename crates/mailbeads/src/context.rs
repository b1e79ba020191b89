// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-invocation state handed to every command.

use std::path::{Path, PathBuf};

use mailbeads_beads::BeadsCli;
use mailbeads_config::{MailbeadsConfig, TriageBackend};
use mailbeads_core::MailbeadsError;
use mailbeads_gmail::GmailClient;
use mailbeads_storage::{Database, SchemaGeneration, discovery};
use mailbeads_workflow::status::TriageSource;

use crate::display::Output;

/// Configuration, output flags, and the open store for one `mb` run.
pub struct CommandContext {
    pub config: MailbeadsConfig,
    pub out: Output,
    cwd: PathBuf,
    db_override: Option<PathBuf>,
    store: Option<Database>,
}

/// Schema generation implied by the configured backend.
pub fn generation_for(backend: TriageBackend) -> SchemaGeneration {
    match backend {
        TriageBackend::Beads => SchemaGeneration::CrossReference,
        TriageBackend::Local => SchemaGeneration::SelfContained,
    }
}

/// Store path from `--db`, then `storage.database_path`, then discovery
/// upward from `cwd`.
pub fn resolve_store_path(
    db_override: Option<&Path>,
    config: &MailbeadsConfig,
    cwd: &Path,
) -> Option<PathBuf> {
    db_override
        .map(Path::to_path_buf)
        .or_else(|| config.storage.database_path.as_ref().map(PathBuf::from))
        .or_else(|| discovery::discover_store(cwd))
}

/// Directory whose `.mailbeads/config.toml` applies, found before config is
/// loaded.
pub fn config_project_dir(db_override: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    let store = db_override
        .map(Path::to_path_buf)
        .or_else(|| discovery::discover_store(cwd))?;
    discovery::project_dir_for_store(&store).map(Path::to_path_buf)
}

impl CommandContext {
    pub fn new(
        config: MailbeadsConfig,
        out: Output,
        cwd: PathBuf,
        db_override: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            out,
            cwd,
            db_override,
            store: None,
        }
    }

    pub fn generation(&self) -> SchemaGeneration {
        generation_for(self.config.triage.backend)
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn db_override(&self) -> Option<&Path> {
        self.db_override.as_deref()
    }

    /// Locate and open the store at the configured generation.
    pub async fn open_store(&mut self) -> Result<(), MailbeadsError> {
        let path = resolve_store_path(self.db_override.as_deref(), &self.config, &self.cwd)
            .ok_or_else(|| {
                MailbeadsError::Config(
                    "no mailbeads database found, run 'mb init' first".to_string(),
                )
            })?;
        self.store = Some(Database::open(&path, self.generation()).await?);
        Ok(())
    }

    /// The open store. Commands that need one must have it opened by `main`.
    pub fn db(&self) -> Result<&Database, MailbeadsError> {
        self.store
            .as_ref()
            .ok_or_else(|| MailbeadsError::Internal("store not opened".to_string()))
    }

    /// Close the store, flushing the connection.
    pub async fn close(&mut self) -> Result<(), MailbeadsError> {
        match self.store.take() {
            Some(db) => db.close().await,
            None => Ok(()),
        }
    }

    /// Directory holding the per-account credential folders: the git project
    /// root, else the store's project directory, else the working directory.
    pub fn accounts_root(&self) -> PathBuf {
        discovery::find_project_root(&self.cwd)
            .or_else(|| {
                self.db()
                    .ok()
                    .and_then(Database::path)
                    .and_then(discovery::project_dir_for_store)
                    .map(Path::to_path_buf)
            })
            .unwrap_or_else(|| self.cwd.clone())
    }

    pub fn tracker(&self) -> BeadsCli {
        BeadsCli::new(&self.config.beads, &self.cwd)
    }

    pub fn provider(&self) -> Result<GmailClient, MailbeadsError> {
        GmailClient::new(&self.config.gmail, self.accounts_root())
    }

    pub fn labels(&self) -> &[String] {
        &self.config.beads.labels
    }

    /// Where status and stats read triage state from.
    pub fn triage_source<'a>(&'a self, tracker: &'a BeadsCli) -> TriageSource<'a> {
        match self.generation() {
            SchemaGeneration::SelfContained => TriageSource::Ledger,
            SchemaGeneration::CrossReference => TriageSource::Tracker {
                tracker,
                labels: self.labels(),
            },
        }
    }
}
