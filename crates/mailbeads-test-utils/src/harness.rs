// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary project with an on-disk store.
//!
//! `TestStore` lays out `<tmp>/.mailbeads/mail.db` exactly as `mb init`
//! would, so tests exercise the real schema and migration paths.

use std::path::{Path, PathBuf};

use mailbeads_core::{Email, MailbeadsError};
use mailbeads_storage::queries::emails;
use mailbeads_storage::{Database, SchemaGeneration, discovery};
use tempfile::TempDir;

/// A temporary project root holding an open store.
pub struct TestStore {
    dir: TempDir,
    db: Database,
}

impl TestStore {
    /// Create a fresh project and open its store at `generation`.
    pub async fn new(generation: SchemaGeneration) -> Result<Self, MailbeadsError> {
        let dir = tempfile::tempdir().map_err(|e| MailbeadsError::Internal(format!(
            "cannot create temp dir: {e}"
        )))?;
        let db = Database::open(discovery::store_path(dir.path()), generation).await?;
        Ok(Self { dir, db })
    }

    /// Store in cross-reference mode.
    pub async fn cross_reference() -> Result<Self, MailbeadsError> {
        Self::new(SchemaGeneration::CrossReference).await
    }

    /// Store in self-contained mode.
    pub async fn self_contained() -> Result<Self, MailbeadsError> {
        Self::new(SchemaGeneration::SelfContained).await
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Project root (the directory containing `.mailbeads/`).
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        discovery::store_path(self.dir.path())
    }

    /// Insert messages, returning how many were new.
    pub async fn seed(&self, messages: &[Email]) -> Result<usize, MailbeadsError> {
        let mut inserted = 0;
        for email in messages {
            if emails::insert_email(&self.db, email).await? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Close the store and open it again at `generation`.
    ///
    /// Used to drive migrations between modes on the same file.
    pub async fn reopen(self, generation: SchemaGeneration) -> Result<Self, MailbeadsError> {
        let Self { dir, db } = self;
        db.close().await?;
        let db = Database::open(discovery::store_path(dir.path()), generation).await?;
        Ok(Self { dir, db })
    }
}

/// Build a stored message with fixed sender and fetch time.
pub fn email(id: &str, account: &str, thread_id: &str, date: &str) -> Email {
    Email {
        id: id.to_string(),
        account: account.to_string(),
        thread_id: thread_id.to_string(),
        message_id: None,
        from: "sender@example.com".to_string(),
        to: Some(account.to_string()),
        cc: None,
        subject: format!("subject {thread_id}"),
        snippet: Some(format!("snippet {id}")),
        body: Some(format!("body {id}")),
        date: date.to_string(),
        labels: Some("INBOX,UNREAD".to_string()),
        is_read: false,
        fetched_at: "2026-01-05T10:00:00Z".to_string(),
    }
}
