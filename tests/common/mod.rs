//! In-memory fakes for the remote clients, recording every call.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

use ci_dispatch::github::{
    ChangedFile, Commit, CommitDetail, PrComment, PullRequestInfo, RepoRef, Signature, SourceHost,
};
use ci_dispatch::jira::{Issue, IssueStatus, IssueTracker, IssueType, TrackerError, Transition};
use ci_dispatch::services::Services;
use ci_dispatch::slack::{ChatClient, WebhookClient};

/// TLS clients need a process-wide crypto provider; the binary installs it
/// in `main`.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

pub fn issue(key: &str, status: &str, category: &str) -> Issue {
    Issue {
        key: key.into(),
        summary: format!("Summary of {key}"),
        description: None,
        issue_type: IssueType {
            name: "Úkol".into(),
            subtask: false,
        },
        status: IssueStatus {
            name: status.into(),
            category: category.into(),
        },
        labels: vec![],
        components: vec![],
        parent: None,
    }
}

pub fn subtask(key: &str, parent: &str, status: &str, category: &str) -> Issue {
    let mut issue = issue(key, status, category);
    issue.issue_type = IssueType {
        name: "Podúkol".into(),
        subtask: true,
    };
    issue.parent = Some(parent.into());
    issue
}

pub fn transition(id: &str, name: &str) -> Transition {
    Transition {
        id: id.into(),
        name: name.into(),
    }
}

// ---------------------------------------------------------------------------
// Issue tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerCall {
    Fetch(String),
    ListTransitions(String),
    Apply { key: String, transition_id: String },
    Comment { key: String, body: JsonValue },
    UpdateFields { key: String, fields: JsonValue },
    PatchFields { key: String, update: JsonValue },
}

#[derive(Default)]
pub struct FakeTracker {
    issues: HashMap<String, Issue>,
    transitions: HashMap<String, Vec<Transition>>,
    failing_fetches: HashSet<String>,
    failing_comments: HashSet<String>,
    calls: Mutex<Vec<TrackerCall>>,
}

impl FakeTracker {
    pub fn with_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        Self {
            issues: issues.into_iter().map(|i| (i.key.clone(), i)).collect(),
            ..Self::default()
        }
    }

    pub fn transitions(mut self, key: &str, transitions: Vec<Transition>) -> Self {
        self.transitions.insert(key.into(), transitions);
        self
    }

    pub fn failing_fetch(mut self, key: &str) -> Self {
        self.failing_fetches.insert(key.into());
        self
    }

    pub fn failing_comment(mut self, key: &str) -> Self {
        self.failing_comments.insert(key.into());
        self
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than fetches, i.e. the ones that read or change workflow state.
    pub fn mutating_calls(&self) -> Vec<TrackerCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, TrackerCall::Fetch(_)))
            .collect()
    }

    fn record(&self, call: TrackerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn server_error(operation: &'static str, key: &str) -> TrackerError {
    TrackerError::Remote {
        operation,
        key: key.into(),
        status: http::StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".into(),
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn fetch_issue(&self, key: &str, _fields: &str) -> Result<Issue, TrackerError> {
        self.record(TrackerCall::Fetch(key.into()));
        if self.failing_fetches.contains(key) {
            return Err(server_error("fetching issue", key));
        }
        self.issues
            .get(key)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound { key: key.into() })
    }

    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>, TrackerError> {
        self.record(TrackerCall::ListTransitions(key.into()));
        Ok(self.transitions.get(key).cloned().unwrap_or_default())
    }

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError> {
        self.record(TrackerCall::Apply {
            key: key.into(),
            transition_id: transition_id.into(),
        });
        Ok(())
    }

    async fn add_comment(&self, key: &str, body: &JsonValue) -> Result<(), TrackerError> {
        self.record(TrackerCall::Comment {
            key: key.into(),
            body: body.clone(),
        });
        if self.failing_comments.contains(key) {
            return Err(server_error("adding comment", key));
        }
        Ok(())
    }

    async fn update_fields(&self, key: &str, fields: &JsonValue) -> Result<(), TrackerError> {
        self.record(TrackerCall::UpdateFields {
            key: key.into(),
            fields: fields.clone(),
        });
        Ok(())
    }

    async fn patch_fields(&self, key: &str, update: &JsonValue) -> Result<(), TrackerError> {
        self.record(TrackerCall::PatchFields {
            key: key.into(),
            update: update.clone(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Source host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    PullRequest(u64),
    List(u64),
    Create { pr: u64, body: String },
    Update { comment_id: u64, body: String },
    Commits(u64),
    Files(u64),
    Commit { repo: Option<String>, sha: String },
}

pub fn commit(sha: &str, message: &str) -> Commit {
    let signature = Signature {
        name: Some("Dana Novak".into()),
        email: Some("dana@example.com".into()),
        date: Some("2025-01-01T00:00:00Z".into()),
    };
    Commit {
        sha: sha.into(),
        html_url: Some(format!("https://github.com/acme/shop/commit/{sha}")),
        commit: CommitDetail {
            message: message.into(),
            author: Some(signature.clone()),
            committer: Some(signature),
        },
    }
}

pub struct FakeHost {
    title: Option<String>,
    body: Option<String>,
    commits: Vec<Commit>,
    files: Vec<String>,
    comments: Mutex<Vec<PrComment>>,
    next_id: AtomicU64,
    failing_markers: HashSet<String>,
    calls: Mutex<Vec<HostCall>>,
}

impl FakeHost {
    pub fn new(title: &str) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
            commits: Vec::new(),
            files: Vec::new(),
            comments: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            failing_markers: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_comment(self, id: u64, body: &str) -> Self {
        self.comments.lock().unwrap().push(PrComment {
            id,
            body: Some(body.into()),
        });
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Commits listed on the PR; also the ones `commit` can find by SHA.
    pub fn with_commits(mut self, commits: impl IntoIterator<Item = Commit>) -> Self {
        self.commits.extend(commits);
        self
    }

    pub fn with_files(mut self, files: &[&str]) -> Self {
        self.files.extend(files.iter().map(|f| f.to_string()));
        self
    }

    /// Fail any write whose body contains `needle`.
    pub fn failing_writes_containing(mut self, needle: &str) -> Self {
        self.failing_markers.insert(needle.into());
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<PrComment> {
        self.comments.lock().unwrap().clone()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_write(&self, body: &str) -> Result<()> {
        if self.failing_markers.iter().any(|m| body.contains(m.as_str())) {
            bail!("write rejected");
        }
        Ok(())
    }
}

#[async_trait]
impl SourceHost for FakeHost {
    async fn pull_request(&self, number: u64) -> Result<PullRequestInfo> {
        self.record(HostCall::PullRequest(number));
        Ok(PullRequestInfo {
            number,
            title: self.title.clone(),
            body: self.body.clone(),
        })
    }

    async fn list_pull_request_comments(&self, number: u64) -> Result<Vec<PrComment>> {
        self.record(HostCall::List(number));
        Ok(self.comments())
    }

    async fn create_pull_request_comment(&self, number: u64, body: &str) -> Result<PrComment> {
        self.record(HostCall::Create {
            pr: number,
            body: body.into(),
        });
        self.check_write(body)?;
        let comment = PrComment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            body: Some(body.into()),
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        self.record(HostCall::Update {
            comment_id,
            body: body.into(),
        });
        self.check_write(body)?;
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| anyhow!("comment {comment_id} not found"))?;
        comment.body = Some(body.into());
        Ok(())
    }

    async fn pull_request_commits(&self, number: u64) -> Result<Vec<Commit>> {
        self.record(HostCall::Commits(number));
        Ok(self.commits.clone())
    }

    async fn pull_request_files(&self, number: u64) -> Result<Vec<ChangedFile>> {
        self.record(HostCall::Files(number));
        Ok(self
            .files
            .iter()
            .map(|filename| ChangedFile {
                filename: filename.clone(),
            })
            .collect())
    }

    async fn commit(&self, repo: Option<&RepoRef>, sha: &str) -> Result<Commit> {
        self.record(HostCall::Commit {
            repo: repo.map(RepoRef::full_name),
            sha: sha.into(),
        });
        self.commits
            .iter()
            .find(|c| c.sha == sha)
            .cloned()
            .ok_or_else(|| anyhow!("No commit found for SHA: {sha}"))
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeChat {
    pub messages: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((channel.into(), text.into()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeWebhook {
    pub posts: Mutex<Vec<(String, JsonValue)>>,
    pub failing: bool,
}

impl FakeWebhook {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn posts(&self) -> Vec<(String, JsonValue)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookClient for FakeWebhook {
    async fn post_webhook(&self, url: &str, payload: &JsonValue) -> Result<()> {
        self.posts
            .lock()
            .unwrap()
            .push((url.into(), payload.clone()));
        if self.failing {
            bail!("Slack webhook request failed: 400 Bad Request. Response: invalid_payload");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeServices {
    pub tracker: Option<Arc<FakeTracker>>,
    pub host: Option<Arc<FakeHost>>,
    pub chat: Option<Arc<FakeChat>>,
    pub webhook: Option<Arc<FakeWebhook>>,
}

impl Services for FakeServices {
    fn issue_tracker(&self) -> Result<Arc<dyn IssueTracker>> {
        let tracker = self.tracker.clone().ok_or_else(|| anyhow!("no tracker configured"))?;
        Ok(tracker)
    }

    fn source_host(&self) -> Result<Arc<dyn SourceHost>> {
        let host = self.host.clone().ok_or_else(|| anyhow!("no host configured"))?;
        Ok(host)
    }

    fn chat(&self) -> Result<Arc<dyn ChatClient>> {
        let chat = self.chat.clone().ok_or_else(|| anyhow!("no chat configured"))?;
        Ok(chat)
    }

    fn webhook(&self) -> Result<Arc<dyn WebhookClient>> {
        let webhook = self.webhook.clone().ok_or_else(|| anyhow!("no webhook configured"))?;
        Ok(webhook)
    }
}

/// Dispatch one command against `services` with default config.
pub async fn run_command(
    services: &FakeServices,
    command: &str,
    subcommand: &str,
    args: JsonValue,
) -> (Result<()>, ci_dispatch::outputs::OutputWriter) {
    let config = ci_dispatch::config::AppConfig::default();
    run_command_with(services, &config, command, subcommand, args).await
}

pub async fn run_command_with(
    services: &FakeServices,
    config: &ci_dispatch::config::AppConfig,
    command: &str,
    subcommand: &str,
    args: JsonValue,
) -> (Result<()>, ci_dispatch::outputs::OutputWriter) {
    let mut outputs = ci_dispatch::outputs::OutputWriter::new(None);
    let result = {
        let mut ctx = ci_dispatch::commands::Context {
            services,
            config,
            outputs: &mut outputs,
        };
        ci_dispatch::commands::dispatch(&mut ctx, command, subcommand, &args).await
    };
    (result, outputs)
}
