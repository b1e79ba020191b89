// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Self-contained triage ledger (schema v1).
//!
//! Every function here requires a [`SchemaGeneration::SelfContained`] store.

use std::collections::BTreeMap;

use mailbeads_core::{MailbeadsError, Priority, Status, TriageDecision, TriageRecord, clock};
use rand::RngCore;
use rusqlite::OptionalExtension;
use rusqlite::types::Type;
use strum::IntoEnumIterator;
use tracing::{debug, info};

use crate::database::{Database, map_call_err, map_tr_err};
use crate::schema::SchemaGeneration;

const RECORD_COLUMNS: &str = "t.id, t.thread_id, t.account, t.subject, t.from_addr, t.priority, \
     t.action, t.suggestion, t.agent_notes, t.category, t.status, t.snoozed_until, \
     t.email_count, t.latest_date, t.created_at, t.updated_at";

const PRIORITY_ORDER: &str = "CASE t.priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 \
     WHEN 'low' THEN 2 WHEN 'spam' THEN 3 ELSE 4 END";

/// Priority rank, then latest date descending. `latest_date` holds the raw
/// header, so dates are compared parsed rather than as text.
fn order_records(records: &mut [TriageRecord]) {
    records.sort_by(|a, b| {
        a.priority.cmp(&b.priority).then_with(|| {
            let newer = b.latest_date.as_deref().map(clock::sort_key);
            newer.cmp(&a.latest_date.as_deref().map(clock::sort_key))
        })
    });
}

/// Result of [`upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub id: String,
    pub created: bool,
}

/// Generate a 16-character lowercase hex record ID.
pub fn generate_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn parse_column<T: std::str::FromStr>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TriageRecord> {
    Ok(TriageRecord {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        account: row.get(2)?,
        subject: row.get(3)?,
        from: row.get(4)?,
        priority: parse_column(row, 5)?,
        action: row.get(6)?,
        suggestion: row.get(7)?,
        agent_notes: row.get(8)?,
        category: row.get(9)?,
        status: parse_column(row, 10)?,
        snoozed_until: row.get(11)?,
        email_count: row.get(12)?,
        latest_date: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Create or update the record for a thread.
///
/// Re-triaging always resets the status to pending and keeps the original
/// ID and `created_at`.
pub async fn upsert(db: &Database, decision: &TriageDecision) -> Result<Upserted, MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    decision.validate()?;

    let d = decision.clone();
    let new_id = generate_id();
    let now = clock::now();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM triage WHERE thread_id = ?1 AND account = ?2",
                    rusqlite::params![d.thread_id, d.account],
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE triage SET
                            subject = ?1, from_addr = ?2, priority = ?3, action = ?4,
                            suggestion = ?5, agent_notes = ?6, category = ?7,
                            email_count = ?8, latest_date = ?9, updated_at = ?10,
                            status = 'pending'
                         WHERE id = ?11",
                        rusqlite::params![
                            d.subject,
                            d.from,
                            d.priority.to_string(),
                            d.action,
                            d.suggestion,
                            d.agent_notes,
                            d.category,
                            d.email_count,
                            d.latest_date,
                            now,
                            id,
                        ],
                    )?;
                    Upserted { id, created: false }
                }
                None => {
                    tx.execute(
                        "INSERT INTO triage
                            (id, thread_id, account, subject, from_addr, priority, action,
                             suggestion, agent_notes, category, status, email_count,
                             latest_date, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'pending', ?11, ?12, ?13)",
                        rusqlite::params![
                            new_id,
                            d.thread_id,
                            d.account,
                            d.subject,
                            d.from,
                            d.priority.to_string(),
                            d.action,
                            d.suggestion,
                            d.agent_notes,
                            d.category,
                            d.email_count,
                            d.latest_date,
                            now,
                        ],
                    )?;
                    Upserted {
                        id: new_id,
                        created: true,
                    }
                }
            };
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)?;

    info!(id = %outcome.id, created = outcome.created, "triage record saved");
    Ok(outcome)
}

/// Record for a thread, if one exists.
pub async fn get(
    db: &Database,
    thread_id: &str,
    account: &str,
) -> Result<Option<TriageRecord>, MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    let thread_id = thread_id.to_string();
    let account = account.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM triage t
                     WHERE t.thread_id = ?1 AND t.account = ?2"
                ),
                rusqlite::params![thread_id, account],
                row_to_record,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Resolve a record by exact ID, falling back to a unique case-sensitive prefix.
pub async fn get_by_id(db: &Database, id: &str) -> Result<TriageRecord, MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    let needle = id.to_string();
    let mut matches = db
        .connection()
        .call(move |conn| {
            let exact = conn
                .query_row(
                    &format!("SELECT {RECORD_COLUMNS} FROM triage t WHERE t.id = ?1"),
                    [&needle],
                    row_to_record,
                )
                .optional()?;
            if let Some(record) = exact {
                return Ok(vec![record]);
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM triage t
                 WHERE substr(t.id, 1, length(?1)) = ?1
                 ORDER BY t.id"
            ))?;
            let rows = stmt.query_map([&needle], row_to_record)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    debug!(prefix = id, matches = matches.len(), "resolved triage ID");
    match matches.len() {
        0 => Err(MailbeadsError::not_found("triage record", id)),
        1 => Ok(matches.remove(0)),
        _ => Err(MailbeadsError::AmbiguousId {
            prefix: id.to_string(),
            matches: matches.into_iter().map(|r| r.id).collect(),
        }),
    }
}

/// Set the status of a record by exact ID.
pub async fn set_status(db: &Database, id: &str, status: Status) -> Result<(), MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    let id_owned = id.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE triage SET status = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![status.to_string(), clock::now(), id_owned],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(MailbeadsError::not_found("triage record", id));
    }
    info!(id, %status, "triage status updated");
    Ok(())
}

/// Hide an open record from `ready` until `until` has passed.
///
/// `until` may be any RFC 3339 or RFC 2822 timestamp; it is stored normalized.
/// Only pending or snoozed records can be snoozed. Closed records stay
/// closed until re-triaged.
pub async fn snooze(db: &Database, id: &str, until: &str) -> Result<String, MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    let until = clock::parse_any(until).map(clock::format).ok_or_else(|| {
        MailbeadsError::Validation(format!("invalid snooze timestamp {until:?}"))
    })?;
    let id_owned = id.to_string();
    let stored = until.clone();
    let (changed, current) = db
        .connection()
        .call(move |conn| -> rusqlite::Result<(usize, Option<String>)> {
            let changed = conn.execute(
                "UPDATE triage SET snoozed_until = ?1, status = 'pending', updated_at = ?2
                 WHERE id = ?3 AND status IN ('pending', 'snoozed')",
                rusqlite::params![stored, clock::now(), id_owned],
            )?;
            let current: Option<String> = if changed == 0 {
                conn.query_row("SELECT status FROM triage WHERE id = ?1", [&id_owned], |row| {
                    row.get(0)
                })
                .optional()?
            } else {
                None
            };
            Ok((changed, current))
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(match current {
            Some(status) => MailbeadsError::Validation(format!(
                "triage record {id} is {status}; re-triage the thread to reopen it"
            )),
            None => MailbeadsError::not_found("triage record", id),
        });
    }
    info!(id, until = %until, "triage record snoozed");
    Ok(until)
}

/// Record that `record_id` is blocked by `depends_on_id`.
///
/// Both records must exist. Adding the same edge twice is a no-op.
pub async fn add_dependency(
    db: &Database,
    record_id: &str,
    depends_on_id: &str,
) -> Result<(), MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    if record_id == depends_on_id {
        return Err(MailbeadsError::Validation(
            "a triage record cannot depend on itself".into(),
        ));
    }
    let child = record_id.to_string();
    let parent = depends_on_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), MailbeadsError> {
            let exists = |id: &str| -> Result<bool, MailbeadsError> {
                conn.query_row("SELECT 1 FROM triage WHERE id = ?1", [id], |_| Ok(()))
                    .optional()
                    .map(|found| found.is_some())
                    .map_err(|e| MailbeadsError::Storage {
                        source: Box::new(e),
                    })
            };
            for id in [&child, &parent] {
                if !exists(id.as_str())? {
                    return Err(MailbeadsError::not_found("triage record", id.as_str()));
                }
            }
            conn.execute(
                "INSERT OR IGNORE INTO triage_deps (triage_id, depends_on_id, created_at)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![child, parent, clock::now()],
            )
            .map_err(|e| MailbeadsError::Storage {
                source: Box::new(e),
            })?;
            Ok(())
        })
        .await
        .map_err(map_call_err)?;
    debug!(record_id, depends_on_id, "dependency recorded");
    Ok(())
}

/// List records by status and account substring.
///
/// With no status and `include_all = false`, only pending records are
/// returned. Ordered by priority rank, then latest date descending.
pub async fn list(
    db: &Database,
    status: Option<Status>,
    account: Option<&str>,
    include_all: bool,
) -> Result<Vec<TriageRecord>, MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    let status = if include_all {
        None
    } else {
        Some(status.unwrap_or(Status::Pending).to_string())
    };
    let account = account.filter(|a| !a.is_empty()).map(str::to_string);
    let mut records = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM triage t
                 WHERE (?1 IS NULL OR t.status = ?1)
                   AND (?2 IS NULL OR t.account LIKE '%' || ?2 || '%')
                 ORDER BY {PRIORITY_ORDER}"
            ))?;
            let rows = stmt.query_map(rusqlite::params![status, account], row_to_record)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;
    order_records(&mut records);
    Ok(records)
}

/// Actionable records: pending, not snoozed past now, not blocked by a
/// pending direct dependency.
pub async fn ready(
    db: &Database,
    account: Option<&str>,
) -> Result<Vec<TriageRecord>, MailbeadsError> {
    ready_at(db, account, &clock::now()).await
}

/// [`ready`] evaluated at an explicit timestamp.
pub async fn ready_at(
    db: &Database,
    account: Option<&str>,
    now: &str,
) -> Result<Vec<TriageRecord>, MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    let account = account.filter(|a| !a.is_empty()).map(str::to_string);
    let now = now.to_string();
    let mut records = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM triage t
                 WHERE t.status = 'pending'
                   AND (t.snoozed_until IS NULL OR t.snoozed_until = '' OR t.snoozed_until <= ?1)
                   AND NOT EXISTS (
                       SELECT 1 FROM triage_deps d
                       JOIN triage blocker ON d.depends_on_id = blocker.id
                       WHERE d.triage_id = t.id AND blocker.status = 'pending'
                   )
                   AND (?2 IS NULL OR t.account LIKE '%' || ?2 || '%')
                 ORDER BY {PRIORITY_ORDER}"
            ))?;
            let rows = stmt.query_map(rusqlite::params![now, account], row_to_record)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;
    order_records(&mut records);
    Ok(records)
}

/// Record counts by status; every status is present.
pub async fn count_by_status(db: &Database) -> Result<BTreeMap<Status, i64>, MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    let rows = grouped_counts(db, "SELECT status, COUNT(*) FROM triage GROUP BY status").await?;
    let mut counts: BTreeMap<Status, i64> = Status::iter().map(|s| (s, 0)).collect();
    for (raw, n) in rows {
        if let Ok(status) = raw.parse::<Status>() {
            counts.insert(status, n);
        }
    }
    Ok(counts)
}

/// Pending record counts by priority; every priority is present.
pub async fn count_by_priority(db: &Database) -> Result<BTreeMap<Priority, i64>, MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    let rows = grouped_counts(
        db,
        "SELECT priority, COUNT(*) FROM triage WHERE status = 'pending' GROUP BY priority",
    )
    .await?;
    let mut counts: BTreeMap<Priority, i64> = Priority::iter().map(|p| (p, 0)).collect();
    for (raw, n) in rows {
        if let Ok(priority) = raw.parse::<Priority>() {
            counts.insert(priority, n);
        }
    }
    Ok(counts)
}

/// Total number of records.
pub async fn count(db: &Database) -> Result<i64, MailbeadsError> {
    db.require(SchemaGeneration::SelfContained)?;
    db.connection()
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM triage", [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)
}

async fn grouped_counts(
    db: &Database,
    sql: &'static str,
) -> Result<Vec<(String, i64)>, MailbeadsError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
