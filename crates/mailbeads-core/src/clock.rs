// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp formatting shared by the store and the workflows.

use chrono::{DateTime, NaiveDate, Utc};

/// Stored timestamp layout. Lexicographic order matches chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Current time as a stored timestamp.
pub fn now() -> String {
    format(Utc::now())
}

/// Format an instant as a stored timestamp.
pub fn format(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a message date header or stored timestamp.
///
/// Accepts RFC 2822 (with or without a trailing `(TZ)` comment), RFC 3339,
/// and a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_any(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    let without_comment = match trimmed.rfind(" (") {
        Some(idx) if trimmed.ends_with(')') => &trimmed[..idx],
        _ => trimmed,
    };
    DateTime::parse_from_rfc2822(without_comment)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// Ordering key for message dates: parseable dates sort chronologically and
/// above unparseable ones, which fall back to string order.
pub fn sort_key(value: &str) -> (Option<DateTime<Utc>>, &str) {
    (parse_any(value), value)
}
