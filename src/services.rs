use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::env::require_env;
use crate::config::types::AppConfig;
use crate::github::types::RepoRef;
use crate::github::{GitHubClient, SourceHost, auth as github_auth};
use crate::jira::auth::JiraCredentials;
use crate::jira::{IssueTracker, JiraClient};
use crate::slack::{ChatClient, SlackClient, SlackWebhook, WebhookClient};

/// Hands out remote clients to handlers.
///
/// Clients are built on demand so a handler that has nothing to do never
/// needs credentials for services it would not call.
pub trait Services {
    fn issue_tracker(&self) -> Result<Arc<dyn IssueTracker>>;
    fn source_host(&self) -> Result<Arc<dyn SourceHost>>;
    fn chat(&self) -> Result<Arc<dyn ChatClient>>;
    fn webhook(&self) -> Result<Arc<dyn WebhookClient>>;
}

/// Real clients configured from the app config and the environment.
pub struct RemoteServices<'a> {
    config: &'a AppConfig,
}

impl<'a> RemoteServices<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }
}

impl Services for RemoteServices<'_> {
    fn issue_tracker(&self) -> Result<Arc<dyn IssueTracker>> {
        let base_url = self
            .config
            .jira
            .base_url
            .as_deref()
            .context("Missing required environment variable: ATLASSIAN_API_BASE_URL")?;
        let credentials = JiraCredentials::from_env()?;
        let client = JiraClient::new(base_url, credentials).context("building Jira client")?;
        Ok(Arc::new(client))
    }

    fn source_host(&self) -> Result<Arc<dyn SourceHost>> {
        let slug = self
            .config
            .github
            .repository
            .as_deref()
            .context("Missing required environment variable: GITHUB_REPOSITORY")?;
        let repo = RepoRef::parse(slug).with_context(|| {
            format!("invalid repository format: {slug}. Expected format: owner/repo")
        })?;
        let api_url = self.config.github.api_url.as_deref();
        let token = github_auth::resolve_token(api_url)?;
        let client = GitHubClient::connect(token, api_url, repo)?;
        Ok(Arc::new(client))
    }

    fn chat(&self) -> Result<Arc<dyn ChatClient>> {
        let [token] = require_env(["SLACK_BOT_TOKEN"])?;
        Ok(Arc::new(SlackClient::new(&self.config.slack.api_url, token)?))
    }

    fn webhook(&self) -> Result<Arc<dyn WebhookClient>> {
        Ok(Arc::new(SlackWebhook::new()?))
    }
}
