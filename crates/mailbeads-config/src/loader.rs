// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports `~/.config/mailbeads/mailbeads.toml` < `<project>/.mailbeads/config.toml`
//! with environment variable overrides via the `MAILBEADS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MailbeadsConfig;

/// Config sections that environment variables may address.
const SECTIONS: &[&str] = &["general", "storage", "triage", "sync", "beads", "gmail"];

/// Path of the per-user config file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mailbeads/mailbeads.toml"))
}

/// Path of the per-project config file.
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".mailbeads/config.toml")
}

/// Load configuration from the file hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `~/.config/mailbeads/mailbeads.toml` (user config)
/// 3. `<project_dir>/.mailbeads/config.toml` (project config, when known)
/// 4. `MAILBEADS_*` environment variables
pub fn load_config(project_dir: Option<&Path>) -> Result<MailbeadsConfig, figment::Error> {
    build_figment(project_dir).extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MailbeadsConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MailbeadsConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MailbeadsConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MailbeadsConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading before extraction.
pub fn build_figment(project_dir: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(MailbeadsConfig::default()));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    if let Some(dir) = project_dir {
        figment = figment.merge(Toml::file(project_config_path(dir)));
    }
    figment.merge(env_provider())
}

/// Create the environment variable provider with explicit section mapping.
///
/// Only the first `_` after a known section name becomes a dot, so
/// `MAILBEADS_SYNC_MAX_RESULTS` maps to `sync.max_results`, not
/// `sync.max.results`. Unknown sections pass through unchanged.
fn env_provider() -> Env {
    Env::prefixed("MAILBEADS_").map(|key| {
        let key_str = key.as_str();
        let mapped = SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}
