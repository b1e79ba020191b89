// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock issue tracker for deterministic testing.
//!
//! `MockTracker` keeps issues in memory with sequential `bd-N` IDs and records
//! every call, so tests can assert both the resulting state and that a
//! rejected operation never reached the tracker.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mailbeads_core::{Issue, IssueTracker, MailbeadsError, NewIssue, clock};

struct State {
    available: bool,
    labels: Vec<String>,
    issues: BTreeMap<String, Issue>,
    next_id: u32,
    comments: Vec<(String, String)>,
    dependencies: Vec<(String, String)>,
    calls: Vec<String>,
    failing_ops: BTreeSet<String>,
    failing_ids: BTreeSet<String>,
}

/// In-memory issue tracker.
#[derive(Clone)]
pub struct MockTracker {
    state: Arc<Mutex<State>>,
}

impl MockTracker {
    /// Create an available tracker that labels new issues `email,triage`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                available: true,
                labels: vec!["email".to_string(), "triage".to_string()],
                issues: BTreeMap::new(),
                next_id: 1,
                comments: Vec::new(),
                dependencies: Vec::new(),
                calls: Vec::new(),
                failing_ops: BTreeSet::new(),
                failing_ids: BTreeSet::new(),
            })),
        }
    }

    /// Toggle availability.
    pub async fn set_available(&self, available: bool) {
        self.state.lock().await.available = available;
    }

    /// Make every call of `op` (for example `"close"`) fail.
    pub async fn fail_op(&self, op: &str) {
        self.state.lock().await.failing_ops.insert(op.to_string());
    }

    /// Make every call naming issue `id` fail.
    pub async fn fail_id(&self, id: &str) {
        self.state.lock().await.failing_ids.insert(id.to_string());
    }

    /// Insert an issue as if created elsewhere.
    pub async fn insert_issue(&self, issue: Issue) {
        self.state
            .lock()
            .await
            .issues
            .insert(issue.id.clone(), issue);
    }

    pub async fn issue(&self, id: &str) -> Option<Issue> {
        self.state.lock().await.issues.get(id).cloned()
    }

    pub async fn issues(&self) -> Vec<Issue> {
        self.state.lock().await.issues.values().cloned().collect()
    }

    /// `(issue id, text)` for every comment posted.
    pub async fn comments(&self) -> Vec<(String, String)> {
        self.state.lock().await.comments.clone()
    }

    /// `(child, parent)` for every dependency added.
    pub async fn dependencies(&self) -> Vec<(String, String)> {
        self.state.lock().await.dependencies.clone()
    }

    /// Every call in order, as `op` or `op id`.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Record a call and apply injected failures.
    fn enter(&mut self, op: &str, id: Option<&str>) -> Result<(), MailbeadsError> {
        self.calls.push(match id {
            Some(id) => format!("{op} {id}"),
            None => op.to_string(),
        });
        if self.failing_ops.contains(op) || id.is_some_and(|id| self.failing_ids.contains(id)) {
            return Err(MailbeadsError::tracker(format!("bd {op}: injected failure")));
        }
        Ok(())
    }

    fn issue_mut(&mut self, id: &str) -> Result<&mut Issue, MailbeadsError> {
        self.issues
            .get_mut(id)
            .ok_or_else(|| MailbeadsError::tracker(format!("no issue found matching {id:?}")))
    }

    fn is_blocked(&self, id: &str) -> bool {
        self.dependencies.iter().any(|(child, parent)| {
            child == id && self.issues.get(parent).is_some_and(|p| !p.is_closed())
        })
    }
}

fn has_labels(issue: &Issue, labels: &[String]) -> bool {
    labels.iter().all(|l| issue.labels.contains(l))
}

fn limited(mut issues: Vec<Issue>, limit: u32) -> Vec<Issue> {
    if limit > 0 {
        issues.truncate(limit as usize);
    }
    issues
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn is_available(&self) -> bool {
        self.state.lock().await.available
    }

    async fn create(&self, new: &NewIssue) -> Result<Issue, MailbeadsError> {
        let mut state = self.state.lock().await;
        state.enter("create", None)?;
        let id = format!("bd-{}", state.next_id);
        state.next_id += 1;

        let mut labels = state.labels.clone();
        labels.extend(new.category.iter().filter(|c| !c.is_empty()).cloned());
        labels.extend(new.labels.iter().cloned());

        let now = clock::now();
        let issue = Issue {
            id: id.clone(),
            title: new.title.clone(),
            description: new.description.clone(),
            notes: new.notes.clone(),
            status: "open".to_string(),
            priority: i64::from(new.priority.tracker_level()),
            issue_type: Some("task".to_string()),
            external_ref: Some(new.external_ref()),
            labels,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            close_reason: None,
        };
        if let Some(parent) = new.parent.as_deref().filter(|p| !p.is_empty()) {
            state.dependencies.push((id.clone(), parent.to_string()));
        }
        state.issues.insert(id, issue.clone());
        Ok(issue)
    }

    async fn update(&self, id: &str, fields: &BTreeMap<String, String>) -> Result<(), MailbeadsError> {
        let mut state = self.state.lock().await;
        state.enter("update", Some(id))?;
        let issue = state.issue_mut(id)?;
        for (key, value) in fields {
            match key.as_str() {
                "title" => issue.title = value.clone(),
                "description" => issue.description = Some(value.clone()),
                "notes" => issue.notes = Some(value.clone()),
                "status" => issue.status = value.clone(),
                "priority" => {
                    issue.priority = value.parse().map_err(|_| {
                        MailbeadsError::tracker(format!("invalid priority {value:?}"))
                    })?;
                }
                other => {
                    return Err(MailbeadsError::tracker(format!("unknown flag --{other}")));
                }
            }
        }
        issue.updated_at = Some(clock::now());
        Ok(())
    }

    async fn close(&self, id: &str, reason: &str) -> Result<(), MailbeadsError> {
        let mut state = self.state.lock().await;
        state.enter("close", Some(id))?;
        let issue = state.issue_mut(id)?;
        issue.status = "closed".to_string();
        issue.close_reason = Some(reason.to_string()).filter(|r| !r.is_empty());
        issue.updated_at = Some(clock::now());
        Ok(())
    }

    async fn show(&self, id: &str) -> Result<Option<Issue>, MailbeadsError> {
        let mut state = self.state.lock().await;
        state.enter("show", Some(id))?;
        Ok(state.issues.get(id).cloned())
    }

    async fn list(
        &self,
        labels: &[String],
        status: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Issue>, MailbeadsError> {
        let mut state = self.state.lock().await;
        state.enter("list", None)?;
        let issues = state
            .issues
            .values()
            .filter(|i| has_labels(i, labels))
            .filter(|i| status.is_none_or(|s| i.status == s))
            .cloned()
            .collect();
        Ok(limited(issues, limit))
    }

    async fn ready(&self, labels: &[String], limit: u32) -> Result<Vec<Issue>, MailbeadsError> {
        let mut state = self.state.lock().await;
        state.enter("ready", None)?;
        let mut issues: Vec<Issue> = state
            .issues
            .values()
            .filter(|i| i.status == "open" && has_labels(i, labels) && !state.is_blocked(&i.id))
            .cloned()
            .collect();
        issues.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        Ok(limited(issues, limit))
    }

    async fn add_dependency(&self, child: &str, parent: &str) -> Result<(), MailbeadsError> {
        let mut state = self.state.lock().await;
        state.enter("dep", Some(child))?;
        state.issue_mut(child)?;
        state.issue_mut(parent)?;
        state
            .dependencies
            .push((child.to_string(), parent.to_string()));
        Ok(())
    }

    async fn comment(&self, id: &str, text: &str) -> Result<(), MailbeadsError> {
        let mut state = self.state.lock().await;
        state.enter("comment", Some(id))?;
        state.issue_mut(id)?;
        state.comments.push((id.to_string(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailbeads_core::Priority;

    fn new_issue(thread: &str) -> NewIssue {
        NewIssue {
            title: format!("Reply to {thread}"),
            priority: Priority::High,
            category: Some("work".into()),
            thread_id: thread.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_labels() {
        let tracker = MockTracker::new();
        let a = tracker.create(&new_issue("t1")).await.unwrap();
        let b = tracker.create(&new_issue("t2")).await.unwrap();

        assert_eq!(a.id, "bd-1");
        assert_eq!(b.id, "bd-2");
        assert_eq!(a.labels, vec!["email", "triage", "work"]);
        assert_eq!(a.external_ref.as_deref(), Some("mb:t1"));
        assert_eq!(a.priority, 1);
    }

    #[tokio::test]
    async fn ready_excludes_blocked_and_closed() {
        let tracker = MockTracker::new();
        let parent = tracker.create(&new_issue("t1")).await.unwrap();
        let child = tracker.create(&new_issue("t2")).await.unwrap();
        let done = tracker.create(&new_issue("t3")).await.unwrap();
        tracker.add_dependency(&child.id, &parent.id).await.unwrap();
        tracker.close(&done.id, "done").await.unwrap();

        let ready: Vec<String> = tracker
            .ready(&[], 0)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ready, vec![parent.id.clone()]);

        tracker.close(&parent.id, "done").await.unwrap();
        let ready = tracker.ready(&[], 0).await.unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, child.id);
    }

    #[tokio::test]
    async fn injected_failure_is_recorded() {
        let tracker = MockTracker::new();
        let issue = tracker.create(&new_issue("t1")).await.unwrap();
        tracker.fail_op("close").await;

        assert!(tracker.close(&issue.id, "done").await.is_err());
        assert!(!tracker.issue(&issue.id).await.unwrap().is_closed());
        assert_eq!(tracker.calls().await, vec!["create", "close bd-1"]);
    }
}
