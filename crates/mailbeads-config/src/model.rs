// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for mailbeads.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level mailbeads configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MailbeadsConfig {
    /// Logging and general behavior.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Store location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Which triage backend owns decisions.
    #[serde(default)]
    pub triage: TriageConfig,

    /// Mail sync behavior.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Issue tracker (`bd`) settings.
    #[serde(default)]
    pub beads: BeadsConfig,

    /// Gmail REST client settings.
    #[serde(default)]
    pub gmail: GmailConfig,
}

/// General configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Explicit store path. `None` discovers `.mailbeads/mail.db` upward
    /// from the working directory.
    #[serde(default)]
    pub database_path: Option<String>,
}

/// Triage backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageBackend {
    /// Decisions live in the external issue tracker; the store keeps refs.
    #[default]
    Beads,
    /// Decisions live in the local store.
    Local,
}

/// Triage configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriageConfig {
    #[serde(default)]
    pub backend: TriageBackend,
}

/// Sync configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Search window used when no stored message gives an incremental start.
    #[serde(default = "default_window")]
    pub default_window: String,

    /// Maximum results requested per account search.
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Search all mail instead of just the inbox.
    #[serde(default)]
    pub include_spam: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_window: default_window(),
            max_results: default_max_results(),
            include_spam: false,
        }
    }
}

fn default_window() -> String {
    "newer_than:3d".to_string()
}

fn default_max_results() -> u32 {
    100
}

/// Issue tracker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BeadsConfig {
    /// Tracker binary name or path.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Labels applied to, and used to filter, triage issues.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Limit for `list` calls.
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,

    /// Limit for `ready` calls.
    #[serde(default = "default_ready_limit")]
    pub ready_limit: u32,
}

impl Default for BeadsConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            labels: default_labels(),
            list_limit: default_list_limit(),
            ready_limit: default_ready_limit(),
        }
    }
}

fn default_binary() -> String {
    "bd".to_string()
}

fn default_labels() -> Vec<String> {
    vec!["email".to_string(), "triage".to_string()]
}

fn default_list_limit() -> u32 {
    50
}

fn default_ready_limit() -> u32 {
    20
}

/// Gmail client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GmailConfig {
    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MailbeadsConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.triage.backend, TriageBackend::Beads);
        assert_eq!(config.sync.default_window, "newer_than:3d");
        assert_eq!(config.sync.max_results, 100);
        assert_eq!(config.beads.binary, "bd");
        assert_eq!(config.beads.labels, vec!["email", "triage"]);
        assert!(config.storage.database_path.is_none());
    }

    #[test]
    fn backend_serializes_lowercase() {
        let json = serde_json::to_string(&TriageBackend::Local).unwrap();
        assert_eq!(json, "\"local\"");
    }
}
