// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store operations.

use mailbeads_core::{Email, MailbeadsError, clock};
use rusqlite::OptionalExtension;
use tracing::debug;

use crate::database::{Database, map_tr_err};

pub(crate) const EMAIL_COLUMNS: &str = "id, account, thread_id, message_id, from_addr, to_addr, \
     cc, subject, snippet, body, date, labels, is_read, fetched_at";

pub(crate) fn row_to_email(row: &rusqlite::Row<'_>) -> rusqlite::Result<Email> {
    Ok(Email {
        id: row.get(0)?,
        account: row.get(1)?,
        thread_id: row.get(2)?,
        message_id: row.get(3)?,
        from: row.get(4)?,
        to: row.get(5)?,
        cc: row.get(6)?,
        subject: row.get(7)?,
        snippet: row.get(8)?,
        body: row.get(9)?,
        date: row.get(10)?,
        labels: row.get(11)?,
        is_read: row.get(12)?,
        fetched_at: row.get(13)?,
    })
}

/// Insert a message, ignoring duplicates.
///
/// Returns `true` if the row was newly written. A duplicate ID keeps the
/// first-inserted content.
pub async fn insert_email(db: &Database, email: &Email) -> Result<bool, MailbeadsError> {
    let email = email.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO emails
                    (id, account, thread_id, message_id, from_addr, to_addr, cc, subject,
                     snippet, body, date, labels, is_read, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                rusqlite::params![
                    email.id,
                    email.account,
                    email.thread_id,
                    email.message_id,
                    email.from,
                    email.to,
                    email.cc,
                    email.subject,
                    email.snippet,
                    email.body,
                    email.date,
                    email.labels,
                    email.is_read,
                    email.fetched_at,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(inserted == 1)
}

/// Whether a message ID is already stored.
pub async fn email_exists(db: &Database, id: &str) -> Result<bool, MailbeadsError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row("SELECT 1 FROM emails WHERE id = ?1", [&id], |_| Ok(()))
                .optional()
                .map(|found| found.is_some())
        })
        .await
        .map_err(map_tr_err)
}

/// Latest message date header stored for an account, by parsed date.
pub async fn latest_date(db: &Database, account: &str) -> Result<Option<String>, MailbeadsError> {
    let account = account.to_string();
    let dates = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT date FROM emails WHERE account = ?1")?;
            let rows = stmt.query_map([&account], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(dates.into_iter().max_by(|a, b| clock::sort_key(a).cmp(&clock::sort_key(b))))
}

/// Most recent local fetch timestamp for an account.
pub async fn latest_fetched_at(
    db: &Database,
    account: &str,
) -> Result<Option<String>, MailbeadsError> {
    let account = account.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT MAX(fetched_at) FROM emails WHERE account = ?1",
                [&account],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of stored messages.
pub async fn count_all(db: &Database) -> Result<i64, MailbeadsError> {
    db.connection()
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM emails", [], |row| row.get(0)))
        .await
        .map_err(map_tr_err)
}

/// Number of stored messages for one account.
pub async fn count_by_account(db: &Database, account: &str) -> Result<i64, MailbeadsError> {
    let account = account.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM emails WHERE account = ?1",
                [&account],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Messages of a thread, oldest first.
pub async fn thread_messages(
    db: &Database,
    thread_id: &str,
    account: &str,
) -> Result<Vec<Email>, MailbeadsError> {
    let thread_id = thread_id.to_string();
    let account = account.to_string();
    let mut emails = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EMAIL_COLUMNS} FROM emails
                 WHERE thread_id = ?1 AND account = ?2
                 ORDER BY fetched_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(rusqlite::params![thread_id, account], row_to_email)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;
    emails.sort_by(|a, b| clock::sort_key(&a.date).cmp(&clock::sort_key(&b.date)));
    Ok(emails)
}

/// Accounts a thread ID appears under, sorted.
pub async fn thread_accounts(db: &Database, thread_id: &str) -> Result<Vec<String>, MailbeadsError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT account FROM emails WHERE thread_id = ?1 ORDER BY account",
            )?;
            let rows = stmt.query_map([&thread_id], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Resolve the account for a thread.
///
/// An explicit account is returned as is. Otherwise the thread must appear
/// under exactly one account.
pub async fn resolve_account(
    db: &Database,
    thread_id: &str,
    account: Option<&str>,
) -> Result<String, MailbeadsError> {
    if let Some(account) = account.filter(|a| !a.is_empty()) {
        return Ok(account.to_string());
    }
    let mut accounts = thread_accounts(db, thread_id).await?;
    debug!(thread_id, candidates = accounts.len(), "resolving thread account");
    match accounts.len() {
        0 => Err(MailbeadsError::not_found("thread", thread_id)),
        1 => Ok(accounts.remove(0)),
        _ => Err(MailbeadsError::AmbiguousAccount {
            thread_id: thread_id.to_string(),
            accounts,
        }),
    }
}

/// Distinct accounts with stored mail, sorted.
pub async fn distinct_accounts(db: &Database) -> Result<Vec<String>, MailbeadsError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT account FROM emails ORDER BY account")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of distinct `(thread_id, account)` pairs.
pub async fn distinct_thread_count(db: &Database) -> Result<i64, MailbeadsError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM (SELECT 1 FROM emails GROUP BY thread_id, account)",
                [],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
