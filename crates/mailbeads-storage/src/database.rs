// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mailbeads_core::MailbeadsError;
use tracing::debug;

use crate::schema::{self, SchemaGeneration};

/// Convert a tokio-rusqlite error into `MailbeadsError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MailbeadsError {
    MailbeadsError::Storage {
        source: Box::new(e),
    }
}

/// Unwrap a domain error raised inside a connection call.
pub(crate) fn map_call_err(e: tokio_rusqlite::Error<MailbeadsError>) -> MailbeadsError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => MailbeadsError::Storage {
            source: other.to_string().into(),
        },
    }
}

/// Handle to an opened mailbeads store.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: Option<PathBuf>,
    generation: SchemaGeneration,
}

impl Database {
    /// Open (or create) the store at `path`, bringing the schema to `generation`.
    ///
    /// Parent directories are created as needed. A failed migration aborts the
    /// open and leaves the file as it was.
    pub async fn open(
        path: impl AsRef<Path>,
        generation: SchemaGeneration,
    ) -> Result<Self, MailbeadsError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| MailbeadsError::Storage {
                source: Box::new(e),
            })?;
        }
        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| MailbeadsError::Storage {
                source: Box::new(e),
            })?;
        let db = Self::init(conn, Some(path), generation).await?;
        debug!(path = ?db.path, %generation, "store opened");
        Ok(db)
    }

    /// Open a private in-memory store. Used by tests.
    pub async fn open_in_memory(generation: SchemaGeneration) -> Result<Self, MailbeadsError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| MailbeadsError::Storage {
                source: Box::new(e),
            })?;
        Self::init(conn, None, generation).await
    }

    async fn init(
        conn: tokio_rusqlite::Connection,
        path: Option<PathBuf>,
        generation: SchemaGeneration,
    ) -> Result<Self, MailbeadsError> {
        conn.call(move |conn| -> Result<(), MailbeadsError> {
            apply_pragmas(conn).map_err(|e| MailbeadsError::Storage {
                source: Box::new(e),
            })?;
            schema::prepare_schema(conn, generation)
        })
        .await
        .map_err(map_call_err)?;

        Ok(Self {
            conn,
            path,
            generation,
        })
    }

    /// The underlying connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// File path, or `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Schema generation this handle was opened with.
    pub fn generation(&self) -> SchemaGeneration {
        self.generation
    }

    /// Fail unless the store holds `expected`.
    pub fn require(&self, expected: SchemaGeneration) -> Result<(), MailbeadsError> {
        if self.generation == expected {
            Ok(())
        } else {
            Err(MailbeadsError::Validation(format!(
                "this command needs a {expected} store but the store is {}; \
                 set triage.backend = \"{}\"",
                self.generation,
                expected.backend_name()
            )))
        }
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), MailbeadsError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("store closed");
        Ok(())
    }
}

fn apply_pragmas(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    debug!(journal_mode = %mode, "pragmas applied");
    Ok(())
}
