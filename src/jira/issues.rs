use futures::future::join_all;

use crate::jira::client::IssueTracker;
use crate::jira::error::TrackerError;
use crate::jira::types::Issue;

/// Policy flags for [`load_issues`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Also resolve and include each key's parent (the issue itself when it
    /// is not a subtask).
    pub load_parent: bool,
    /// Leave subtasks out of the result; their parents still come through
    /// `load_parent`.
    pub skip_subtasks: bool,
}

/// Fetch a single issue.
pub async fn fetch_issue(
    tracker: &dyn IssueTracker,
    key: &str,
    fields: &str,
) -> Result<Issue, TrackerError> {
    tracker.fetch_issue(key, fields).await
}

/// Fetch `key`, substituting its parent when it is a subtask. One level only.
pub async fn resolve_to_parent(
    tracker: &dyn IssueTracker,
    key: &str,
    fields: &str,
) -> Result<Issue, TrackerError> {
    let issue = tracker.fetch_issue(key, fields).await?;
    match issue.subtask_parent() {
        Some(parent) => {
            tracing::info!("fetching parent issue {parent} for subtask {key}");
            tracker.fetch_issue(parent, fields).await
        }
        None => Ok(issue),
    }
}

/// Fetch every key, tolerating individual failures.
///
/// The result is not deduplicated by key: every successful fetch is its own
/// entry, so a non-subtask loaded with `load_parent` shows up twice, as does a
/// subtask listed next to its own parent.
pub async fn load_issues(
    tracker: &dyn IssueTracker,
    keys: &[String],
    options: LoadOptions,
    fields: &str,
) -> Vec<Issue> {
    let per_key = keys
        .iter()
        .map(|key| load_one(tracker, key, options, fields));
    join_all(per_key).await.into_iter().flatten().collect()
}

async fn load_one(
    tracker: &dyn IssueTracker,
    key: &str,
    options: LoadOptions,
    fields: &str,
) -> Vec<Issue> {
    let issue = match tracker.fetch_issue(key, fields).await {
        Ok(issue) => issue,
        Err(e) => {
            tracing::error!("failed to load issue {key}: {e}");
            return Vec::new();
        }
    };

    let mut loaded = Vec::with_capacity(2);
    if options.load_parent {
        match resolve_to_parent(tracker, key, fields).await {
            Ok(parent) => loaded.push(parent),
            Err(e) => tracing::error!("failed to load parent of issue {key}: {e}"),
        }
    }
    if options.skip_subtasks && issue.is_subtask() {
        tracing::debug!("skipping subtask {key}");
    } else {
        loaded.push(issue);
    }
    loaded
}
