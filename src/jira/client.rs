use async_trait::async_trait;
use http::StatusCode;
use reqwest::{RequestBuilder, Response, Url};
use serde_json::Value as JsonValue;

use crate::jira::auth::JiraCredentials;
use crate::jira::error::TrackerError;
use crate::jira::types::{Issue, RawIssue, RawTransitions, Transition};

const API_PATH: [&str; 3] = ["rest", "api", "3"];

/// Operations the handlers need from the issue tracker.
///
/// Every call goes to the remote; nothing is cached between calls.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn fetch_issue(&self, key: &str, fields: &str) -> Result<Issue, TrackerError>;

    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>, TrackerError>;

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError>;

    /// `body` is an Atlassian Document Format document.
    async fn add_comment(&self, key: &str, body: &JsonValue) -> Result<(), TrackerError>;

    /// Overwrite fields (`{"fields": ...}` edit).
    async fn update_fields(&self, key: &str, fields: &JsonValue) -> Result<(), TrackerError>;

    /// Apply add/remove/set operations (`{"update": ...}` edit).
    async fn patch_fields(&self, key: &str, update: &JsonValue) -> Result<(), TrackerError>;
}

/// Jira Cloud REST v3 client.
pub struct JiraClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: JiraCredentials,
}

impl JiraClient {
    pub fn new(base_url: &str, credentials: JiraCredentials) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ci-dispatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                TrackerError::Validation(format!("invalid Jira base URL: {base_url}"))
            })?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// `/rest/api/3/issue/{key}` plus `rest`. The key is percent-encoded as a
    /// single path segment.
    fn issue_url(&self, key: &str, rest: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(API_PATH)
                .push("issue")
                .push(key)
                .extend(rest);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, TrackerError> {
        let response = request
            .basic_auth(&self.credentials.username, Some(&self.credentials.token))
            .send()
            .await?;
        tracing::debug!("jira: {} {}", response.status(), response.url());
        Ok(response)
    }
}

/// Split a response into success or `(status, body)` for error reporting.
async fn check(response: Response) -> Result<Response, (StatusCode, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err((status, body))
}

fn remote(operation: &'static str, key: &str, (status, body): (StatusCode, String)) -> TrackerError {
    TrackerError::Remote {
        operation,
        key: key.to_owned(),
        status,
        body,
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn fetch_issue(&self, key: &str, fields: &str) -> Result<Issue, TrackerError> {
        let request = self
            .http
            .get(self.issue_url(key, &[]))
            .query(&[("fields", fields)]);
        match check(self.send(request).await?).await {
            Ok(response) => {
                let raw: RawIssue = response.json().await?;
                Ok(raw.into())
            }
            Err((StatusCode::NOT_FOUND, _)) => Err(TrackerError::NotFound {
                key: key.to_owned(),
            }),
            Err(err) => Err(remote("fetching issue", key, err)),
        }
    }

    async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>, TrackerError> {
        let request = self.http.get(self.issue_url(key, &["transitions"]));
        let response = check(self.send(request).await?)
            .await
            .map_err(|err| remote("fetching transitions", key, err))?;
        let raw: RawTransitions = response.json().await?;
        Ok(raw.transitions)
    }

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError> {
        let payload = serde_json::json!({ "transition": { "id": transition_id } });
        let request = self
            .http
            .post(self.issue_url(key, &["transitions"]))
            .json(&payload);
        check(self.send(request).await?)
            .await
            .map_err(|(status, body)| TrackerError::TransitionApply {
                key: key.to_owned(),
                transition_id: transition_id.to_owned(),
                status,
                body,
            })?;
        Ok(())
    }

    async fn add_comment(&self, key: &str, body: &JsonValue) -> Result<(), TrackerError> {
        let payload = serde_json::json!({ "body": body });
        let request = self
            .http
            .post(self.issue_url(key, &["comment"]))
            .json(&payload);
        check(self.send(request).await?)
            .await
            .map_err(|err| remote("adding comment", key, err))?;
        Ok(())
    }

    async fn update_fields(&self, key: &str, fields: &JsonValue) -> Result<(), TrackerError> {
        let payload = serde_json::json!({ "fields": fields });
        let request = self
            .http
            .put(self.issue_url(key, &[]))
            .json(&payload);
        check(self.send(request).await?)
            .await
            .map_err(|err| remote("updating fields", key, err))?;
        Ok(())
    }

    async fn patch_fields(&self, key: &str, update: &JsonValue) -> Result<(), TrackerError> {
        let payload = serde_json::json!({ "update": update });
        let request = self
            .http
            .put(self.issue_url(key, &[]))
            .json(&payload);
        check(self.send(request).await?)
            .await
            .map_err(|err| remote("patching fields", key, err))?;
        Ok(())
    }
}
