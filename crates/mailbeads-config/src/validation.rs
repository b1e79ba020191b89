// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::MailbeadsConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound the Gmail list endpoint accepts for `maxResults`.
const MAX_RESULTS_LIMIT: u32 = 500;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &MailbeadsConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.general.log_level.trim();
    if !LOG_LEVELS.contains(&level) {
        errors.push(ConfigError::Validation {
            message: format!(
                "general.log_level `{level}` must be one of: {}",
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if let Some(path) = &config.storage.database_path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty when set".to_string(),
        });
    }

    if config.sync.default_window.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "sync.default_window must not be empty".to_string(),
        });
    }

    if !(1..=MAX_RESULTS_LIMIT).contains(&config.sync.max_results) {
        errors.push(ConfigError::Validation {
            message: format!(
                "sync.max_results must be between 1 and {MAX_RESULTS_LIMIT}, got {}",
                config.sync.max_results
            ),
        });
    }

    if config.beads.binary.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "beads.binary must not be empty".to_string(),
        });
    }

    if config.gmail.api_base.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gmail.api_base must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
