//! Idempotent per-issue validation comments on a pull request.
//!
//! Each issue owns at most one PR comment, identified by an HTML comment
//! marker embedded in its body. Syncing updates that comment in place or
//! creates it when missing.

use std::collections::HashMap;

use anyhow::Result;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::github::client::SourceHost;

// ---------------------------------------------------------------------------
// Validation results (produced upstream, consumed here)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedIssue {
    pub key: String,
    #[serde(default)]
    pub type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDetail {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ValidationDetail {
    fn is_empty(&self) -> bool {
        fn blank(s: Option<&String>) -> bool {
            s.is_none_or(|s| s.is_empty())
        }
        blank(self.summary.as_ref()) && blank(self.description.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub issue: ValidatedIssue,
    /// `ok`, `warn` or `error`; anything else renders as unknown.
    pub status: String,
    #[serde(default)]
    pub recommendations: ValidationDetail,
    #[serde(default)]
    pub suggestions: ValidationDetail,
}

impl ValidationResult {
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

// ---------------------------------------------------------------------------
// Body composition
// ---------------------------------------------------------------------------

/// Marker identifying the comment that reports on `issue_key`.
pub fn comment_marker(issue_key: &str) -> String {
    format!("<!-- JIRA-ISSUES-VALIDATION-{issue_key} -->")
}

fn status_glyph(status: &str) -> &'static str {
    match status {
        "ok" => "✅",
        "warn" => "⚠️",
        "error" => "❌",
        _ => "❓",
    }
}

fn recommendations_block(detail: &ValidationDetail) -> String {
    if detail.is_empty() {
        return String::new();
    }
    format!(
        "\n<details>\n<summary>Doporučení</summary>\n\n\
         | Atribut | Doporučení |\n\
         | ------ | ------------- |\n\
         | Název | {} |\n\
         | Popis | {} |\n\
         </details>\n",
        detail.summary.as_deref().unwrap_or_default(),
        detail.description.as_deref().unwrap_or_default(),
    )
}

fn suggestions_block(detail: &ValidationDetail) -> String {
    if detail.is_empty() {
        return String::new();
    }
    format!(
        "\n<details>\n<summary>Návrh změn</summary>\n\n\
         #### Název:\n\n```\n{}\n```\n\n\
         #### Popis:\n\n```\n{}\n```\n\
         </details>\n",
        detail.summary.as_deref().unwrap_or_default(),
        detail.description.as_deref().unwrap_or_default(),
    )
}

/// Full comment body for one result: marker, header line, optional blocks.
pub fn compose_comment_body(result: &ValidationResult) -> String {
    let glyph = status_glyph(&result.status);
    format!(
        "\n{marker}\n### {glyph} Validace zadání issue {key} ({type_name}) {glyph}\n{rec}\n{sug}\n",
        marker = comment_marker(&result.issue.key),
        key = result.issue.key,
        type_name = result.issue.type_name,
        rec = recommendations_block(&result.recommendations),
        sug = suggestions_block(&result.suggestions),
    )
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Created { comment_id: u64 },
    Updated { comment_id: u64 },
}

/// Upsert the comment for one result.
pub async fn sync_comment_for_pr(
    host: &dyn SourceHost,
    pr_number: u64,
    result: &ValidationResult,
) -> Result<CommentAction> {
    let comments = host.list_pull_request_comments(pr_number).await?;
    let body = compose_comment_body(result);
    let marker = comment_marker(&result.issue.key);

    let existing = comments
        .iter()
        .find(|c| c.body.as_deref().is_some_and(|b| b.contains(&marker)));

    match existing {
        Some(comment) => {
            host.update_comment(comment.id, &body).await?;
            tracing::info!(
                "updated comment {} for {} on PR #{pr_number}",
                comment.id,
                result.issue.key
            );
            Ok(CommentAction::Updated {
                comment_id: comment.id,
            })
        }
        None => {
            let created = host.create_pull_request_comment(pr_number, &body).await?;
            tracing::info!(
                "created comment {} for {} on PR #{pr_number}",
                created.id,
                result.issue.key
            );
            Ok(CommentAction::Created {
                comment_id: created.id,
            })
        }
    }
}

/// Upsert one comment per result, concurrently.
///
/// Results sharing an issue key would race on read-then-write, so only the
/// last one per key is synced. Returns the keys whose sync failed.
pub async fn sync_comments_for_pr(
    host: &dyn SourceHost,
    pr_number: u64,
    results: &[ValidationResult],
) -> Vec<String> {
    let unique = last_per_key(results);
    let outcomes = join_all(unique.into_iter().map(|result| async move {
        (
            result.issue.key.as_str(),
            sync_comment_for_pr(host, pr_number, result).await,
        )
    }))
    .await;

    outcomes
        .into_iter()
        .filter_map(|(key, outcome)| match outcome {
            Ok(_) => None,
            Err(e) => {
                tracing::error!("failed to sync PR comment for {key}: {e:#}");
                Some(key.to_owned())
            }
        })
        .collect()
}

fn last_per_key(results: &[ValidationResult]) -> Vec<&ValidationResult> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<&ValidationResult> = Vec::with_capacity(results.len());
    for result in results {
        let key = result.issue.key.as_str();
        if let Some(&slot) = index.get(key) {
            tracing::warn!("duplicate validation result for {key}; keeping the last one");
            unique[slot] = result;
        } else {
            index.insert(key, unique.len());
            unique.push(result);
        }
    }
    unique
}
