use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;

use crate::github::types::{ChangedFile, Commit, PrComment, PullRequestInfo, RepoRef};

const PER_PAGE: usize = 100;

/// Operations the handlers need from the source host.
#[async_trait]
pub trait SourceHost: Send + Sync {
    async fn pull_request(&self, number: u64) -> Result<PullRequestInfo>;

    async fn list_pull_request_comments(&self, number: u64) -> Result<Vec<PrComment>>;

    async fn create_pull_request_comment(&self, number: u64, body: &str) -> Result<PrComment>;

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()>;

    async fn pull_request_commits(&self, number: u64) -> Result<Vec<Commit>>;

    async fn pull_request_files(&self, number: u64) -> Result<Vec<ChangedFile>>;

    /// Fetch one commit from `repo`, or from the bound repository when `None`.
    async fn commit(&self, repo: Option<&RepoRef>, sha: &str) -> Result<Commit>;
}

/// GitHub REST client bound to one repository.
pub struct GitHubClient {
    octocrab: Arc<Octocrab>,
    repo: RepoRef,
}

impl GitHubClient {
    pub fn new(octocrab: Arc<Octocrab>, repo: RepoRef) -> Self {
        tracing::debug!("github client for {}", repo.full_name());
        Self { octocrab, repo }
    }

    /// Build an authenticated client. `api_url` targets GitHub Enterprise.
    pub fn connect(token: String, api_url: Option<&str>, repo: RepoRef) -> Result<Self> {
        let builder = match api_url {
            Some(url) => Octocrab::builder()
                .personal_token(token)
                .base_uri(url)
                .context("setting GitHub API base URI")?,
            None => Octocrab::builder().personal_token(token),
        };
        let octocrab = builder.build().context("building octocrab instance")?;
        Ok(Self::new(Arc::new(octocrab), repo))
    }

    fn repo_route(&self, rest: &str) -> String {
        format!("/repos/{}/{}{rest}", self.repo.owner, self.repo.name)
    }

    /// GET every page of a list endpoint.
    async fn get_all_pages<T: DeserializeOwned>(&self, route: &str) -> octocrab::Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1_u32;
        loop {
            let mut params: HashMap<&str, String> = HashMap::new();
            params.insert("per_page", PER_PAGE.to_string());
            params.insert("page", page.to_string());
            let batch: Vec<T> = self.octocrab.get(route, Some(&params)).await?;
            let last = batch.len() < PER_PAGE;
            items.extend(batch);
            if last {
                return Ok(items);
            }
            page += 1;
        }
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn pull_request(&self, number: u64) -> Result<PullRequestInfo> {
        tracing::debug!("fetching PR #{number}");
        let route = self.repo_route(&format!("/pulls/{number}"));
        self.octocrab
            .get(route, None::<&()>)
            .await
            .with_context(|| format!("failed to fetch pull request #{number}"))
    }

    async fn list_pull_request_comments(&self, number: u64) -> Result<Vec<PrComment>> {
        tracing::debug!("fetching comments for PR #{number}");
        let route = self.repo_route(&format!("/issues/{number}/comments"));
        self.get_all_pages(&route)
            .await
            .with_context(|| format!("failed to fetch comments for PR #{number}"))
    }

    async fn create_pull_request_comment(&self, number: u64, body: &str) -> Result<PrComment> {
        tracing::debug!("creating comment on PR #{number}");
        let route = self.repo_route(&format!("/issues/{number}/comments"));
        let payload = serde_json::json!({ "body": body });
        self.octocrab
            .post(route, Some(&payload))
            .await
            .with_context(|| format!("failed to create comment on PR #{number}"))
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        tracing::debug!("updating comment {comment_id}");
        let route = self.repo_route(&format!("/issues/comments/{comment_id}"));
        let payload = serde_json::json!({ "body": body });
        let _: serde_json::Value = self
            .octocrab
            .patch(route, Some(&payload))
            .await
            .with_context(|| format!("failed to update comment {comment_id}"))?;
        Ok(())
    }

    async fn pull_request_commits(&self, number: u64) -> Result<Vec<Commit>> {
        tracing::debug!("fetching commits for PR #{number}");
        let route = self.repo_route(&format!("/pulls/{number}/commits"));
        self.get_all_pages(&route)
            .await
            .with_context(|| format!("failed to fetch commits for PR #{number}"))
    }

    async fn pull_request_files(&self, number: u64) -> Result<Vec<ChangedFile>> {
        tracing::debug!("fetching files for PR #{number}");
        let route = self.repo_route(&format!("/pulls/{number}/files"));
        self.get_all_pages(&route)
            .await
            .with_context(|| format!("failed to fetch files for PR #{number}"))
    }

    async fn commit(&self, repo: Option<&RepoRef>, sha: &str) -> Result<Commit> {
        let repo = repo.unwrap_or(&self.repo);
        tracing::debug!("fetching commit {sha} from {}", repo.full_name());
        let route = format!("/repos/{}/{}/commits/{sha}", repo.owner, repo.name);
        self.octocrab
            .get(route, None::<&()>)
            .await
            .with_context(|| format!("failed to fetch commit {sha}"))
    }
}
