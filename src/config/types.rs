use serde::Deserialize;

use crate::jira::status::DONE_CATEGORY;
use crate::jira::types::DEFAULT_ISSUE_FIELDS;
use crate::slack;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub jira: JiraConfig,
    pub github: GitHubConfig,
    pub slack: SlackConfig,
}

// ---------------------------------------------------------------------------
// Jira
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Site URL, e.g. `https://acme.atlassian.net`. Overridden by
    /// `ATLASSIAN_API_BASE_URL`.
    pub base_url: Option<String>,
    /// Status category key treated as terminal.
    pub done_category: String,
    /// Statuses never moved by `update-status`, in any locale or case.
    pub ignore_statuses: Vec<String>,
    /// Comma-separated field list requested when loading issues.
    pub fields: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            done_category: DONE_CATEGORY.to_owned(),
            ignore_statuses: Vec::new(),
            fields: DEFAULT_ISSUE_FIELDS.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API root for GitHub Enterprise. Overridden by `GITHUB_API_URL`.
    pub api_url: Option<String>,
    /// `owner/repo`. Overridden by `GITHUB_REPOSITORY`.
    pub repository: Option<String>,
}

// ---------------------------------------------------------------------------
// Slack
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub api_url: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_url: slack::DEFAULT_API_URL.to_owned(),
        }
    }
}
