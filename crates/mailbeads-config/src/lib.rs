// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for mailbeads.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! user and project file lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{MailbeadsConfig, TriageBackend};

/// Load configuration from the file hierarchy and validate it.
///
/// `project_dir` is the directory holding `.mailbeads/`, when one was found.
pub fn load_and_validate(project_dir: Option<&Path>) -> Result<MailbeadsConfig, Vec<ConfigError>> {
    match loader::load_config(project_dir) {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(backend = ?config.triage.backend, "configuration loaded");
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources(project_dir);
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<MailbeadsConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources(project_dir: Option<&Path>) -> Vec<(String, String)> {
    let paths = loader::user_config_path()
        .into_iter()
        .chain(project_dir.map(loader::project_config_path));

    paths
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
