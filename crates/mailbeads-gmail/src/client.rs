// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gmail REST API.
//!
//! Provides [`GmailClient`], a read-only [`MailProvider`] that authenticates
//! each request with the account's stored access token.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use mailbeads_config::model::GmailConfig;
use mailbeads_core::{FullMessage, MailProvider, MailbeadsError, MessageSummary};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::accounts;
use crate::body;
use crate::types::{ApiErrorResponse, ListMessagesResponse, Message};

/// Headers requested for search summaries.
const METADATA_HEADERS: [&str; 4] = ["From", "To", "Subject", "Date"];

/// Subject used when a message has none.
pub const NO_SUBJECT: &str = "(no subject)";

/// Gmail REST client over a directory of account credentials.
#[derive(Debug, Clone)]
pub struct GmailClient {
    client: reqwest::Client,
    base_url: String,
    root: PathBuf,
}

impl GmailClient {
    /// Create a client whose accounts live under `root`.
    pub fn new(config: &GmailConfig, root: PathBuf) -> Result<Self, MailbeadsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MailbeadsError::Provider {
                account: String::new(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            root,
        })
    }

    /// Directory scanned for account folders.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn url(
        &self,
        account: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Url, MailbeadsError> {
        let raw = format!("{}/users/me/{path}", self.base_url);
        Url::parse_with_params(&raw, params.iter().map(|(k, v)| (*k, v.as_str()))).map_err(|e| {
            MailbeadsError::Provider {
                account: account.to_string(),
                message: format!("invalid API URL {raw}: {e}"),
                source: Some(Box::new(e)),
            }
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        account: &str,
        token: &str,
        url: Url,
    ) -> Result<T, MailbeadsError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| MailbeadsError::Provider {
                account: account.to_string(),
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, path = url.path(), "gmail response received");

        let text = response.text().await.map_err(|e| MailbeadsError::Provider {
            account: account.to_string(),
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(api_err) => format!(
                    "Gmail API error ({}): {}",
                    api_err.error.code, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {text}"),
            };
            return Err(MailbeadsError::provider(account, message));
        }

        serde_json::from_str(&text).map_err(|e| MailbeadsError::Provider {
            account: account.to_string(),
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn get_message(
        &self,
        account: &str,
        token: &str,
        id: &str,
        params: &[(&str, String)],
    ) -> Result<Message, MailbeadsError> {
        let url = self.url(account, &format!("messages/{id}"), params)?;
        self.get_json(account, token, url).await
    }
}

fn subject_or_default(subject: Option<&str>) -> String {
    match subject {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => NO_SUBJECT.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn accounts(&self) -> Result<Vec<String>, MailbeadsError> {
        accounts::discover_accounts(&self.root)
    }

    async fn search(
        &self,
        account: &str,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<MessageSummary>, MailbeadsError> {
        let token = accounts::load_token(&self.root, account).await?;
        let url = self.url(
            account,
            "messages",
            &[("q", query.to_string()), ("maxResults", max_results.to_string())],
        )?;
        let list: ListMessagesResponse = self.get_json(account, &token, url).await?;
        debug!(account, query, found = list.messages.len(), "gmail search");

        let mut params = vec![("format", "metadata".to_string())];
        params.extend(METADATA_HEADERS.iter().map(|h| ("metadataHeaders", h.to_string())));

        let mut summaries = Vec::with_capacity(list.messages.len());
        for msg_ref in &list.messages {
            let detail = match self.get_message(account, &token, &msg_ref.id, &params).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(account, id = %msg_ref.id, error = %e, "skipping message metadata");
                    continue;
                }
            };
            let headers = &detail.payload;
            summaries.push(MessageSummary {
                id: detail.id.clone(),
                thread_id: detail.thread_id.clone(),
                from: headers.header("From").unwrap_or_default().to_string(),
                to: headers.header("To").unwrap_or_default().to_string(),
                subject: subject_or_default(headers.header("Subject")),
                date: headers.header("Date").unwrap_or_default().to_string(),
                snippet: detail.snippet.clone(),
            });
        }
        Ok(summaries)
    }

    async fn read_full(
        &self,
        account: &str,
        message_id: &str,
    ) -> Result<FullMessage, MailbeadsError> {
        let token = accounts::load_token(&self.root, account).await?;
        let msg = self
            .get_message(account, &token, message_id, &[("format", "full".to_string())])
            .await?;
        let payload = &msg.payload;

        Ok(FullMessage {
            id: msg.id.clone(),
            thread_id: msg.thread_id.clone(),
            message_id: non_empty(payload.header("Message-ID")),
            from: payload.header("From").unwrap_or_default().to_string(),
            to: payload.header("To").unwrap_or_default().to_string(),
            cc: non_empty(payload.header("Cc")),
            subject: subject_or_default(payload.header("Subject")),
            date: payload.header("Date").unwrap_or_default().to_string(),
            body: body::extract_body(payload),
            labels: msg.label_ids.clone(),
            snippet: msg.snippet.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_subject_gets_placeholder() {
        assert_eq!(subject_or_default(None), NO_SUBJECT);
        assert_eq!(subject_or_default(Some("")), NO_SUBJECT);
        assert_eq!(subject_or_default(Some("Hi")), "Hi");
    }

    #[test]
    fn url_encodes_query_and_repeats_params() {
        let client = GmailClient::new(&GmailConfig::default(), PathBuf::from("/tmp")).unwrap();
        let url = client
            .url(
                "a@x.com",
                "messages",
                &[
                    ("q", "after:2026/01/02 in:inbox".to_string()),
                    ("metadataHeaders", "From".to_string()),
                    ("metadataHeaders", "To".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(url.path(), "/gmail/v1/users/me/messages");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("q".into(), "after:2026/01/02 in:inbox".into()));
        assert_eq!(
            pairs.iter().filter(|(k, _)| k == "metadataHeaders").count(),
            2
        );
    }
}
