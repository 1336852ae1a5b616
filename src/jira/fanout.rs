use std::fmt::Display;
use std::future::Future;

use futures::future::join_all;

use crate::jira::client::IssueTracker;
use crate::jira::issues::{LoadOptions, load_issues};
use crate::jira::types::Issue;

/// Per-issue results of [`for_each_issue`], in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl FanOutReport {
    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty()
    }
}

/// Load `keys` and run `callback` on every loaded issue concurrently.
///
/// Each callback failure is logged and recorded in the report; it never
/// cancels or fails the others, and this function never returns an error.
pub async fn for_each_issue<F, Fut, T, E>(
    tracker: &dyn IssueTracker,
    keys: &[String],
    options: LoadOptions,
    fields: &str,
    callback: F,
) -> FanOutReport
where
    F: Fn(Issue) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let issues = load_issues(tracker, keys, options, fields).await;
    tracing::debug!("processing {} loaded issue(s)", issues.len());
    run_callbacks(issues, callback).await
}

async fn run_callbacks<F, Fut, T, E>(issues: Vec<Issue>, callback: F) -> FanOutReport
where
    F: Fn(Issue) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let outcomes = join_all(issues.into_iter().map(|issue| {
        let key = issue.key.clone();
        let fut = callback(issue);
        async move { (key, fut.await) }
    }))
    .await;

    let mut report = FanOutReport::default();
    for (key, outcome) in outcomes {
        match outcome {
            Ok(_) => report.succeeded.push(key),
            Err(e) => {
                tracing::error!("error processing issue {key}: {e}");
                report.failed.push(key);
            }
        }
    }
    report
}
