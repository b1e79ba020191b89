// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account directories and stored access tokens.
//!
//! Each account lives in a directory named after its address, next to the
//! project's `.mailbeads/` directory:
//!
//! ```text
//! alice@example.com/
//!   credentials.json
//!   token.json
//! ```

use std::path::{Path, PathBuf};

use mailbeads_core::MailbeadsError;
use serde::Deserialize;

/// Client credentials file that marks a directory as an account.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Stored OAuth token file.
pub const TOKEN_FILE: &str = "token.json";

#[derive(Debug, Deserialize)]
struct StoredToken {
    #[serde(default)]
    token: String,
}

/// Directories under `root` whose name contains `@` and which hold a
/// credentials file, sorted by name.
pub fn discover_accounts(root: &Path) -> Result<Vec<String>, MailbeadsError> {
    let entries = std::fs::read_dir(root).map_err(|e| {
        MailbeadsError::Config(format!(
            "cannot read account directory {}: {e}",
            root.display()
        ))
    })?;

    let mut accounts: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().join(CREDENTIALS_FILE).is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.contains('@'))
        .collect();
    accounts.sort();
    Ok(accounts)
}

/// Path of the token file for `account`.
pub fn token_path(root: &Path, account: &str) -> PathBuf {
    root.join(account).join(TOKEN_FILE)
}

/// Read the access token for `account`.
///
/// A missing file, unparseable JSON, or an empty token field is a provider
/// error for that account.
pub async fn load_token(root: &Path, account: &str) -> Result<String, MailbeadsError> {
    let path = token_path(root, account);
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| MailbeadsError::Provider {
            account: account.to_string(),
            message: format!("cannot read token from {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
    let stored: StoredToken =
        serde_json::from_str(&raw).map_err(|e| MailbeadsError::Provider {
            account: account.to_string(),
            message: format!("cannot parse {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
    if stored.token.is_empty() {
        return Err(MailbeadsError::provider(
            account,
            format!("{} has no access token", path.display()),
        ));
    }
    Ok(stored.token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_account(root: &Path, name: &str, with_credentials: bool) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        if with_credentials {
            std::fs::write(dir.join(CREDENTIALS_FILE), "{}").unwrap();
        }
    }

    #[test]
    fn discovers_only_credentialed_address_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        make_account(tmp.path(), "zed@example.com", true);
        make_account(tmp.path(), "amy@example.com", true);
        make_account(tmp.path(), "nocreds@example.com", false);
        make_account(tmp.path(), "src", true);
        std::fs::write(tmp.path().join("loose@example.com"), "").unwrap();

        let accounts = discover_accounts(tmp.path()).unwrap();
        assert_eq!(accounts, vec!["amy@example.com", "zed@example.com"]);
    }

    #[test]
    fn missing_root_is_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover_accounts(&tmp.path().join("gone")).unwrap_err();
        assert!(matches!(err, MailbeadsError::Config(_)));
    }

    #[tokio::test]
    async fn reads_token_field() {
        let tmp = tempfile::tempdir().unwrap();
        make_account(tmp.path(), "a@x.com", true);
        std::fs::write(
            token_path(tmp.path(), "a@x.com"),
            r#"{"token": "ya29.abc", "refresh_token": "r", "scopes": []}"#,
        )
        .unwrap();

        assert_eq!(load_token(tmp.path(), "a@x.com").await.unwrap(), "ya29.abc");
    }

    #[tokio::test]
    async fn missing_or_empty_token_is_provider_error() {
        let tmp = tempfile::tempdir().unwrap();
        make_account(tmp.path(), "a@x.com", true);

        let err = load_token(tmp.path(), "a@x.com").await.unwrap_err();
        assert!(matches!(err, MailbeadsError::Provider { ref account, .. } if account == "a@x.com"));

        std::fs::write(token_path(tmp.path(), "a@x.com"), r#"{"token": ""}"#).unwrap();
        let err = load_token(tmp.path(), "a@x.com").await.unwrap_err();
        assert!(err.to_string().contains("no access token"));
    }
}
