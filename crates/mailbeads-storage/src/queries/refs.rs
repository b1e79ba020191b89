// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-reference triage table (schema v2).
//!
//! Decision content lives in the issue tracker; a ref only maps a thread to
//! the tracker's record ID. Every function here requires a
//! [`SchemaGeneration::CrossReference`] store.

use std::collections::HashMap;

use mailbeads_core::{LEGACY_PREFIX, MailbeadsError, ThreadWithRef, TriageRef, clock};
use rusqlite::OptionalExtension;
use tracing::{debug, info};

use crate::database::{Database, map_tr_err};
use crate::queries::threads::{ThreadRow, aggregate};
use crate::schema::SchemaGeneration;

fn row_to_ref(row: &rusqlite::Row<'_>) -> rusqlite::Result<TriageRef> {
    Ok(TriageRef {
        thread_id: row.get(0)?,
        account: row.get(1)?,
        external_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Ref for a thread, if one exists.
pub async fn get_ref(
    db: &Database,
    thread_id: &str,
    account: &str,
) -> Result<Option<TriageRef>, MailbeadsError> {
    db.require(SchemaGeneration::CrossReference)?;
    let thread_id = thread_id.to_string();
    let account = account.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT thread_id, account, external_id, created_at FROM triage
                 WHERE thread_id = ?1 AND account = ?2",
                rusqlite::params![thread_id, account],
                row_to_ref,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Ref pointing at an external record, if one exists.
pub async fn get_ref_by_external_id(
    db: &Database,
    external_id: &str,
) -> Result<Option<TriageRef>, MailbeadsError> {
    db.require(SchemaGeneration::CrossReference)?;
    let external_id = external_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT thread_id, account, external_id, created_at FROM triage
                 WHERE external_id = ?1",
                [&external_id],
                row_to_ref,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Point a thread at an external record.
///
/// Replaces the external ID of an existing ref and refreshes its
/// `created_at`, so mail fetched before this call no longer counts as new.
/// Returns `true` when a ref was inserted.
pub async fn upsert_ref(
    db: &Database,
    thread_id: &str,
    account: &str,
    external_id: &str,
) -> Result<bool, MailbeadsError> {
    db.require(SchemaGeneration::CrossReference)?;
    let thread_id = thread_id.to_string();
    let account = account.to_string();
    let ext = external_id.to_string();
    let now = clock::now();
    let created = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let updated = tx.execute(
                "UPDATE triage SET external_id = ?1, created_at = ?2
                 WHERE thread_id = ?3 AND account = ?4",
                rusqlite::params![ext, now, thread_id, account],
            )?;
            if updated == 0 {
                tx.execute(
                    "INSERT INTO triage (thread_id, account, external_id, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![thread_id, account, ext, now],
                )?;
            }
            tx.commit()?;
            Ok(updated == 0)
        })
        .await
        .map_err(map_tr_err)?;
    debug!(external_id, created, "triage ref saved");
    Ok(created)
}

/// Remove the ref for an external record. Missing refs are not an error.
///
/// The pair is remembered as closed so it does not resurface as untriaged
/// until mail newer than the close is fetched. Returns whether a ref was
/// removed.
pub async fn delete_ref(db: &Database, external_id: &str) -> Result<bool, MailbeadsError> {
    db.require(SchemaGeneration::CrossReference)?;
    let ext = external_id.to_string();
    let now = clock::now();
    let deleted = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR REPLACE INTO triage_closed (thread_id, account, external_id, closed_at)
                 SELECT thread_id, account, external_id, ?2 FROM triage WHERE external_id = ?1",
                rusqlite::params![ext, now],
            )?;
            let deleted = tx.execute("DELETE FROM triage WHERE external_id = ?1", [&ext])?;
            tx.commit()?;
            Ok(deleted)
        })
        .await
        .map_err(map_tr_err)?;
    if deleted > 0 {
        info!(external_id, "triage ref deleted");
    }
    Ok(deleted > 0)
}

/// Every ref, ordered by creation.
pub async fn list_refs(db: &Database) -> Result<Vec<TriageRef>, MailbeadsError> {
    db.require(SchemaGeneration::CrossReference)?;
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT thread_id, account, external_id, created_at FROM triage
                 ORDER BY created_at, thread_id",
            )?;
            let rows = stmt.query_map([], row_to_ref)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Refs produced by migration that have no real external record yet.
pub async fn legacy_refs(db: &Database) -> Result<Vec<TriageRef>, MailbeadsError> {
    db.require(SchemaGeneration::CrossReference)?;
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT thread_id, account, external_id, created_at FROM triage
                 WHERE substr(external_id, 1, length(?1)) = ?1
                 ORDER BY created_at, thread_id",
            )?;
            let rows = stmt.query_map([LEGACY_PREFIX], row_to_ref)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of refs.
pub async fn count_refs(db: &Database) -> Result<i64, MailbeadsError> {
    db.require(SchemaGeneration::CrossReference)?;
    db.connection()
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM triage", [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)
}

/// Referenced threads whose newest fetched message is newer than the ref.
pub async fn threads_with_new_mail(db: &Database) -> Result<Vec<ThreadWithRef>, MailbeadsError> {
    db.require(SchemaGeneration::CrossReference)?;
    let rows = db
        .connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.thread_id, t.account, t.external_id, t.created_at,
                        e.subject, e.from_addr, e.date
                 FROM triage t
                 JOIN emails e ON e.thread_id = t.thread_id AND e.account = t.account
                 WHERE t.created_at < (
                     SELECT MAX(e2.fetched_at) FROM emails e2
                     WHERE e2.thread_id = t.thread_id AND e2.account = t.account
                 )",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row_to_ref(row)?,
                    ThreadRow {
                        thread_id: row.get(0)?,
                        account: row.get(1)?,
                        subject: row.get(4)?,
                        from: row.get(5)?,
                        date: row.get(6)?,
                    },
                ))
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    let mut refs: HashMap<(String, String), TriageRef> = HashMap::new();
    let mut thread_rows = Vec::with_capacity(rows.len());
    for (triage_ref, row) in rows {
        refs.entry((triage_ref.thread_id.clone(), triage_ref.account.clone()))
            .or_insert(triage_ref);
        thread_rows.push(row);
    }

    let stale: Vec<ThreadWithRef> = aggregate(thread_rows)
        .into_iter()
        .filter_map(|thread| {
            refs.remove(&(thread.thread_id.clone(), thread.account.clone()))
                .map(|triage_ref| ThreadWithRef { thread, triage_ref })
        })
        .collect();
    debug!(count = stale.len(), "threads with new mail");
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::emails::insert_email;
    use crate::test_support::email;

    async fn db() -> Database {
        Database::open_in_memory(SchemaGeneration::CrossReference)
            .await
            .unwrap()
    }

    async fn set_ref_created_at(db: &Database, thread: &str, at: &str) {
        let thread = thread.to_string();
        let at = at.to_string();
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE triage SET created_at = ?1 WHERE thread_id = ?2",
                    rusqlite::params![at, thread],
                )
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upsert_ref_replaces_external_id() {
        let db = db().await;
        assert!(upsert_ref(&db, "t1", "a@x.com", "bd-1").await.unwrap());
        assert!(!upsert_ref(&db, "t1", "a@x.com", "bd-2").await.unwrap());
        assert_eq!(count_refs(&db).await.unwrap(), 1);

        let r = get_ref(&db, "t1", "a@x.com").await.unwrap().unwrap();
        assert_eq!(r.external_id, "bd-2");
        assert!(get_ref_by_external_id(&db, "bd-1").await.unwrap().is_none());
        assert_eq!(
            get_ref_by_external_id(&db, "bd-2").await.unwrap().unwrap().thread_id,
            "t1"
        );
    }

    #[tokio::test]
    async fn delete_ref_is_best_effort() {
        let db = db().await;
        upsert_ref(&db, "t1", "a@x.com", "bd-1").await.unwrap();
        assert!(delete_ref(&db, "bd-1").await.unwrap());
        assert!(!delete_ref(&db, "bd-1").await.unwrap());
        assert!(get_ref(&db, "t1", "a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn closed_thread_stays_out_of_untriaged_until_new_mail() {
        use crate::queries::threads::untriaged_threads;

        let db = db().await;
        insert_email(&db, &email("m1", "a@x.com", "t1", "Mon, 5 Jan 2026 10:00:00 +0000"))
            .await
            .unwrap();
        upsert_ref(&db, "t1", "a@x.com", "bd-1").await.unwrap();
        delete_ref(&db, "bd-1").await.unwrap();
        assert!(untriaged_threads(&db, None, None).await.unwrap().is_empty());

        let mut reply = email("m2", "a@x.com", "t1", "Mon, 5 Jan 2026 11:00:00 +0000");
        reply.fetched_at = "2999-01-01T00:00:00Z".into();
        insert_email(&db, &reply).await.unwrap();
        assert_eq!(untriaged_threads(&db, None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn staleness_follows_fetch_time() {
        let db = db().await;
        let mut first = email("m1", "a@x.com", "t1", "Mon, 5 Jan 2026 10:00:00 +0000");
        first.fetched_at = "2026-01-05T10:00:00Z".into();
        insert_email(&db, &first).await.unwrap();
        upsert_ref(&db, "t1", "a@x.com", "bd-1").await.unwrap();
        set_ref_created_at(&db, "t1", "2026-01-05T12:00:00Z").await;
        assert!(threads_with_new_mail(&db).await.unwrap().is_empty());

        let mut reply = email("m2", "a@x.com", "t1", "Mon, 5 Jan 2026 13:00:00 +0000");
        reply.fetched_at = "2026-01-05T13:05:00Z".into();
        insert_email(&db, &reply).await.unwrap();

        let stale = threads_with_new_mail(&db).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].triage_ref.external_id, "bd-1");
        assert_eq!(stale[0].thread.email_count, 2);
        assert_eq!(stale[0].thread.latest_date, "Mon, 5 Jan 2026 13:00:00 +0000");
    }

    #[tokio::test]
    async fn legacy_refs_are_prefix_filtered() {
        let db = db().await;
        upsert_ref(&db, "t1", "a@x.com", "legacy-abc").await.unwrap();
        upsert_ref(&db, "t2", "a@x.com", "bd-9").await.unwrap();
        let legacy = legacy_refs(&db).await.unwrap();
        assert_eq!(legacy.len(), 1);
        assert!(legacy[0].is_placeholder());
        assert_eq!(list_refs(&db).await.unwrap().len(), 2);
    }
}
