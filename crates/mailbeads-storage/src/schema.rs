// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema definitions and the v1 -> v2 triage migration.
//!
//! The triage relation exists in two generations. `PRAGMA user_version`
//! records which one a store holds. Stores written before the marker existed
//! carry `user_version = 0` and are classified by [`sniff_legacy_shape`].

use mailbeads_core::{LEGACY_PREFIX, MailbeadsError};
use rusqlite::Connection;
use tracing::{debug, info};

/// Message relation. Shared by both generations.
pub const EMAILS_DDL: &str = "
CREATE TABLE IF NOT EXISTS emails (
    id          TEXT PRIMARY KEY,
    account     TEXT NOT NULL,
    thread_id   TEXT NOT NULL,
    message_id  TEXT,
    from_addr   TEXT NOT NULL,
    to_addr     TEXT,
    cc          TEXT,
    subject     TEXT NOT NULL,
    snippet     TEXT,
    body        TEXT,
    date        TEXT NOT NULL,
    labels      TEXT,
    is_read     INTEGER NOT NULL DEFAULT 0,
    fetched_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_emails_account ON emails(account);
CREATE INDEX IF NOT EXISTS idx_emails_thread ON emails(thread_id, account);
CREATE INDEX IF NOT EXISTS idx_emails_date ON emails(date DESC);
";

/// Self-contained triage ledger (v1).
pub const TRIAGE_V1_DDL: &str = "
CREATE TABLE IF NOT EXISTS triage (
    id             TEXT PRIMARY KEY,
    thread_id      TEXT NOT NULL,
    account        TEXT NOT NULL,
    subject        TEXT NOT NULL,
    from_addr      TEXT,
    priority       TEXT NOT NULL DEFAULT 'medium',
    action         TEXT NOT NULL,
    suggestion     TEXT,
    agent_notes    TEXT,
    category       TEXT,
    status         TEXT NOT NULL DEFAULT 'pending',
    snoozed_until  TEXT,
    email_count    INTEGER NOT NULL DEFAULT 0,
    latest_date    TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT,
    UNIQUE(thread_id, account)
);
CREATE TABLE IF NOT EXISTS triage_deps (
    triage_id      TEXT NOT NULL REFERENCES triage(id) ON DELETE CASCADE,
    depends_on_id  TEXT NOT NULL REFERENCES triage(id) ON DELETE CASCADE,
    created_at     TEXT NOT NULL,
    PRIMARY KEY (triage_id, depends_on_id)
);
CREATE INDEX IF NOT EXISTS idx_triage_status ON triage(status);
CREATE INDEX IF NOT EXISTS idx_triage_deps_blocker ON triage_deps(depends_on_id);
";

/// Cross-reference tables (v2). `triage_closed` remembers pairs whose
/// external record was closed so they stay out of the untriaged set until
/// newer mail arrives.
const TRIAGE_V2_TABLE: &str = "
CREATE TABLE IF NOT EXISTS triage (
    thread_id    TEXT NOT NULL,
    account      TEXT NOT NULL,
    external_id  TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    UNIQUE(thread_id, account)
);
CREATE TABLE IF NOT EXISTS triage_closed (
    thread_id    TEXT NOT NULL,
    account      TEXT NOT NULL,
    external_id  TEXT NOT NULL,
    closed_at    TEXT NOT NULL,
    PRIMARY KEY (thread_id, account)
);
";

/// Cross-reference indexes (v2). Created after the v1 relations are dropped
/// during migration so their names are free.
const TRIAGE_V2_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_triage_external ON triage(external_id);
";

/// Which triage generation a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaGeneration {
    /// Full decision records stored locally.
    SelfContained = 1,
    /// Only `(thread, account) -> external_id` references stored locally.
    CrossReference = 2,
}

impl SchemaGeneration {
    /// Value written to `PRAGMA user_version`.
    pub fn version(self) -> i64 {
        self as i64
    }

    /// `triage.backend` setting that opens stores of this generation.
    pub fn backend_name(self) -> &'static str {
        match self {
            Self::SelfContained => "local",
            Self::CrossReference => "beads",
        }
    }

    fn from_version(version: i64) -> Option<Self> {
        match version {
            1 => Some(Self::SelfContained),
            2 => Some(Self::CrossReference),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchemaGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfContained => f.write_str("v1 (self-contained)"),
            Self::CrossReference => f.write_str("v2 (cross-reference)"),
        }
    }
}

/// Triage table shape found on an unversioned store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyShape {
    /// No triage table yet.
    Empty,
    SelfContained,
    CrossReference,
    /// Early cross-reference store whose column is still named `bead_id`.
    CrossReferenceBeadId,
}

fn storage_err(e: rusqlite::Error) -> MailbeadsError {
    MailbeadsError::Storage {
        source: Box::new(e),
    }
}

fn migration_err(message: &str) -> impl FnOnce(rusqlite::Error) -> MailbeadsError + '_ {
    move |e| MailbeadsError::Migration {
        message: message.to_string(),
        source: Some(Box::new(e)),
    }
}

/// Classify an unversioned store by the columns of its triage table.
///
/// This is the only place that inspects live schema metadata.
pub fn sniff_legacy_shape(conn: &Connection) -> Result<LegacyShape, MailbeadsError> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('triage')")
        .map_err(storage_err)?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(storage_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(storage_err)?;

    let has = |name: &str| columns.iter().any(|c| c == name);
    let shape = if columns.is_empty() {
        LegacyShape::Empty
    } else if has("action") {
        LegacyShape::SelfContained
    } else if has("external_id") {
        LegacyShape::CrossReference
    } else if has("bead_id") {
        LegacyShape::CrossReferenceBeadId
    } else {
        return Err(MailbeadsError::Migration {
            message: format!("unrecognized triage table columns: {}", columns.join(", ")),
            source: None,
        });
    };
    debug!(?shape, "classified unversioned store");
    Ok(shape)
}

/// Bring the schema to `requested`, migrating v1 -> v2 if needed.
///
/// Runs inside a single transaction; any failure leaves the file untouched.
pub fn prepare_schema(
    conn: &mut Connection,
    requested: SchemaGeneration,
) -> Result<(), MailbeadsError> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(storage_err)?;

    let on_disk = match version {
        0 => sniff_legacy_shape(conn)?,
        v => match SchemaGeneration::from_version(v) {
            Some(SchemaGeneration::SelfContained) => LegacyShape::SelfContained,
            Some(SchemaGeneration::CrossReference) => LegacyShape::CrossReference,
            None => {
                return Err(MailbeadsError::Migration {
                    message: format!("unsupported schema version {v}"),
                    source: None,
                });
            }
        },
    };

    let tx = conn.transaction().map_err(storage_err)?;
    tx.execute_batch(EMAILS_DDL)
        .map_err(migration_err("create emails table"))?;

    match (on_disk, requested) {
        (LegacyShape::Empty | LegacyShape::SelfContained, SchemaGeneration::SelfContained) => {
            tx.execute_batch(TRIAGE_V1_DDL)
                .map_err(migration_err("create v1 triage tables"))?;
        }
        (LegacyShape::Empty | LegacyShape::CrossReference, SchemaGeneration::CrossReference) => {
            create_v2(&tx)?;
        }
        (LegacyShape::CrossReferenceBeadId, SchemaGeneration::CrossReference) => {
            tx.execute_batch(
                "DROP INDEX IF EXISTS idx_triage_bead;
                 DROP INDEX IF EXISTS idx_triage_thread;
                 ALTER TABLE triage RENAME COLUMN bead_id TO external_id;",
            )
            .map_err(migration_err("rename bead_id column"))?;
            create_v2(&tx)?;
            info!("renamed triage.bead_id to external_id");
        }
        (LegacyShape::SelfContained, SchemaGeneration::CrossReference) => {
            let carried = migrate_v1_to_v2(&tx)?;
            info!(carried, "migrated triage ledger from v1 to v2");
        }
        (
            LegacyShape::CrossReference | LegacyShape::CrossReferenceBeadId,
            SchemaGeneration::SelfContained,
        ) => {
            return Err(MailbeadsError::Migration {
                message: "store holds cross-reference (v2) triage data; \
                          the local backend needs v1 and there is no downgrade path"
                    .to_string(),
                source: None,
            });
        }
    }

    tx.pragma_update(None, "user_version", requested.version())
        .map_err(storage_err)?;
    tx.commit().map_err(migration_err("commit schema changes"))?;
    Ok(())
}

fn create_v2(conn: &Connection) -> Result<(), MailbeadsError> {
    conn.execute_batch(TRIAGE_V2_TABLE)
        .map_err(migration_err("create v2 triage table"))?;
    conn.execute_batch(TRIAGE_V2_INDEXES)
        .map_err(migration_err("create v2 triage indexes"))
}

/// Replace the v1 ledger with v2 references, keeping pending records only.
///
/// Returns the number of placeholder references written.
fn migrate_v1_to_v2(conn: &Connection) -> Result<usize, MailbeadsError> {
    conn.execute_batch("ALTER TABLE triage RENAME TO triage_old;")
        .map_err(migration_err("rename v1 triage table"))?;
    conn.execute_batch(TRIAGE_V2_TABLE)
        .map_err(migration_err("create v2 triage table"))?;
    let carried = conn
        .execute(
            "INSERT INTO triage (thread_id, account, external_id, created_at)
             SELECT thread_id, account, ?1 || id, created_at
             FROM triage_old
             WHERE status = 'pending'",
            [LEGACY_PREFIX],
        )
        .map_err(migration_err("copy pending v1 records"))?;
    conn.execute_batch(
        "DROP TABLE IF EXISTS triage_deps;
         DROP TABLE IF EXISTS triage_old;",
    )
    .map_err(migration_err("drop v1 triage tables"))?;
    conn.execute_batch(TRIAGE_V2_INDEXES)
        .map_err(migration_err("create v2 triage indexes"))?;
    Ok(carried)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> i64 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    fn columns(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM pragma_table_info('triage')")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn fresh_store_gets_requested_generation() {
        let mut conn = Connection::open_in_memory().unwrap();
        prepare_schema(&mut conn, SchemaGeneration::CrossReference).unwrap();
        assert_eq!(user_version(&conn), 2);
        assert!(columns(&conn).contains(&"external_id".to_string()));

        let mut conn = Connection::open_in_memory().unwrap();
        prepare_schema(&mut conn, SchemaGeneration::SelfContained).unwrap();
        assert_eq!(user_version(&conn), 1);
        assert!(columns(&conn).contains(&"action".to_string()));
    }

    #[test]
    fn prepare_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        prepare_schema(&mut conn, SchemaGeneration::CrossReference).unwrap();
        prepare_schema(&mut conn, SchemaGeneration::CrossReference).unwrap();
        assert_eq!(user_version(&conn), 2);
    }

    #[test]
    fn unversioned_stores_are_sniffed() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(sniff_legacy_shape(&conn).unwrap(), LegacyShape::Empty);

        conn.execute_batch(TRIAGE_V1_DDL).unwrap();
        assert_eq!(
            sniff_legacy_shape(&conn).unwrap(),
            LegacyShape::SelfContained
        );

        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE triage (thread_id TEXT, account TEXT, bead_id TEXT, created_at TEXT);",
        )
        .unwrap();
        assert_eq!(
            sniff_legacy_shape(&conn).unwrap(),
            LegacyShape::CrossReferenceBeadId
        );
    }

    #[test]
    fn bead_id_column_is_renamed() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE triage (
                thread_id TEXT NOT NULL, account TEXT NOT NULL,
                bead_id TEXT NOT NULL, created_at TEXT NOT NULL,
                UNIQUE(thread_id, account));
             CREATE INDEX idx_triage_bead ON triage(bead_id);
             INSERT INTO triage VALUES ('t1', 'a@x.com', 'bd-1', '2026-01-01T00:00:00Z');",
        )
        .unwrap();
        prepare_schema(&mut conn, SchemaGeneration::CrossReference).unwrap();
        let external: String = conn
            .query_row("SELECT external_id FROM triage WHERE thread_id = 't1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(external, "bd-1");
        assert_eq!(user_version(&conn), 2);
    }

    #[test]
    fn local_mode_refuses_v2_store() {
        let mut conn = Connection::open_in_memory().unwrap();
        prepare_schema(&mut conn, SchemaGeneration::CrossReference).unwrap();
        let err = prepare_schema(&mut conn, SchemaGeneration::SelfContained).unwrap_err();
        assert!(matches!(err, MailbeadsError::Migration { .. }));
        assert_eq!(user_version(&conn), 2);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 7).unwrap();
        assert!(matches!(
            prepare_schema(&mut conn, SchemaGeneration::CrossReference),
            Err(MailbeadsError::Migration { .. })
        ));
    }
}
