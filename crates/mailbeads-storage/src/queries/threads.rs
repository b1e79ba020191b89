// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread aggregation over the message store.
//!
//! Threads are never persisted. Subject and sender are the greatest string
//! among the thread's messages; `latest_date` is the greatest date by parsed
//! value, so RFC 2822 headers order chronologically.

use std::collections::BTreeMap;

use mailbeads_core::{MailbeadsError, Thread, clock};

use crate::database::{Database, map_tr_err};
use crate::schema::SchemaGeneration;

/// One message's contribution to a thread aggregate.
pub(crate) struct ThreadRow {
    pub thread_id: String,
    pub account: String,
    pub subject: String,
    pub from: String,
    pub date: String,
}

pub(crate) fn row_to_thread_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ThreadRow> {
    Ok(ThreadRow {
        thread_id: row.get(0)?,
        account: row.get(1)?,
        subject: row.get(2)?,
        from: row.get(3)?,
        date: row.get(4)?,
    })
}

/// Fold message rows into threads, newest thread first.
pub(crate) fn aggregate(rows: Vec<ThreadRow>) -> Vec<Thread> {
    let mut threads: BTreeMap<(String, String), Thread> = BTreeMap::new();
    for row in rows {
        let key = (row.thread_id.clone(), row.account.clone());
        match threads.get_mut(&key) {
            Some(thread) => {
                thread.email_count += 1;
                if row.subject > thread.subject {
                    thread.subject = row.subject;
                }
                if row.from > thread.from {
                    thread.from = row.from;
                }
                if clock::sort_key(&row.date) > clock::sort_key(&thread.latest_date) {
                    thread.latest_date = row.date;
                }
            }
            None => {
                threads.insert(
                    key,
                    Thread {
                        thread_id: row.thread_id,
                        account: row.account,
                        subject: row.subject,
                        from: row.from,
                        email_count: 1,
                        latest_date: row.date,
                    },
                );
            }
        }
    }

    let mut threads: Vec<Thread> = threads.into_values().collect();
    threads.sort_by(|a, b| {
        clock::sort_key(&b.latest_date)
            .cmp(&clock::sort_key(&a.latest_date))
            .then_with(|| a.thread_id.cmp(&b.thread_id))
    });
    threads
}

/// Aggregate view of one thread. Not-found when the pair has no messages.
pub async fn thread_info(
    db: &Database,
    thread_id: &str,
    account: &str,
) -> Result<Thread, MailbeadsError> {
    let key = (thread_id.to_string(), account.to_string());
    let rows = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT thread_id, account, subject, from_addr, date
                 FROM emails WHERE thread_id = ?1 AND account = ?2",
            )?;
            let rows = stmt.query_map(rusqlite::params![key.0, key.1], row_to_thread_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    aggregate(rows)
        .into_iter()
        .next()
        .ok_or_else(|| MailbeadsError::not_found("thread", thread_id))
}

/// Exclusion for pairs closed in the tracker with no mail fetched since.
const CLOSED_FILTER: &str = "
    AND NOT EXISTS (
        SELECT 1 FROM triage_closed c
        WHERE c.thread_id = e.thread_id AND c.account = e.account
          AND c.closed_at >= (
              SELECT MAX(e2.fetched_at) FROM emails e2
              WHERE e2.thread_id = e.thread_id AND e2.account = e.account
          )
    )";

fn untriaged_filter(generation: SchemaGeneration) -> &'static str {
    match generation {
        SchemaGeneration::SelfContained => "",
        SchemaGeneration::CrossReference => CLOSED_FILTER,
    }
}

/// Threads with no triage row for their pair, newest first.
///
/// Works against either triage generation. `account` is an exact match;
/// `limit = None` returns every untriaged thread.
pub async fn untriaged_threads(
    db: &Database,
    account: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<Thread>, MailbeadsError> {
    let account = account.map(str::to_string);
    let sql = format!(
        "SELECT e.thread_id, e.account, e.subject, e.from_addr, e.date
         FROM emails e
         LEFT JOIN triage t ON e.thread_id = t.thread_id AND e.account = t.account
         WHERE t.thread_id IS NULL
           AND (?1 IS NULL OR e.account = ?1){}",
        untriaged_filter(db.generation())
    );
    let rows = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([&account], row_to_thread_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    let mut threads = aggregate(rows);
    if let Some(limit) = limit {
        threads.truncate(limit);
    }
    Ok(threads)
}

/// Number of untriaged threads.
pub async fn untriaged_count(db: &Database) -> Result<i64, MailbeadsError> {
    let sql = format!(
        "SELECT COUNT(*) FROM (
            SELECT 1 FROM emails e
            LEFT JOIN triage t ON e.thread_id = t.thread_id AND e.account = t.account
            WHERE t.thread_id IS NULL{}
            GROUP BY e.thread_id, e.account)",
        untriaged_filter(db.generation())
    );
    db.connection()
        .call(move |conn| conn.query_row(&sql, [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)
}
