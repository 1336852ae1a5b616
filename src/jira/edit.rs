use serde_json::Value as JsonValue;

use crate::jira::adf;
use crate::jira::client::IssueTracker;
use crate::jira::error::TrackerError;

/// Convert `markdown` to a rich-text document and add it as a comment.
pub async fn add_comment(
    tracker: &dyn IssueTracker,
    key: &str,
    markdown: &str,
) -> Result<(), TrackerError> {
    let doc = adf::from_markdown_checked(markdown)?;
    add_comment_document(tracker, key, &doc).await
}

pub(crate) async fn add_comment_document(
    tracker: &dyn IssueTracker,
    key: &str,
    doc: &JsonValue,
) -> Result<(), TrackerError> {
    tracing::debug!("adding comment to issue {key}");
    tracker.add_comment(key, doc).await
}

/// Overwrite fields on an issue, e.g. `{"fixVersions": [{"name": "1.2.0"}]}`.
pub async fn update_fields(
    tracker: &dyn IssueTracker,
    key: &str,
    fields: &JsonValue,
) -> Result<(), TrackerError> {
    ensure_non_empty_object(fields, "fields")?;
    tracker.update_fields(key, fields).await
}

/// Apply edit operations to an issue, e.g. `{"labels": [{"add": "x"}]}`.
pub async fn patch_fields(
    tracker: &dyn IssueTracker,
    key: &str,
    update: &JsonValue,
) -> Result<(), TrackerError> {
    ensure_non_empty_object(update, "update")?;
    tracker.patch_fields(key, update).await
}

fn ensure_non_empty_object(value: &JsonValue, what: &str) -> Result<(), TrackerError> {
    match value.as_object() {
        Some(map) if !map.is_empty() => Ok(()),
        _ => Err(TrackerError::Validation(format!(
            "{what} payload must be a non-empty object"
        ))),
    }
}

/// Build the `labels` edit operations for [`patch_fields`].
pub fn label_operations(add: &[String], remove: &[String]) -> JsonValue {
    let ops: Vec<JsonValue> = add
        .iter()
        .map(|label| serde_json::json!({ "add": label }))
        .chain(remove.iter().map(|label| serde_json::json!({ "remove": label })))
        .collect();
    serde_json::json!({ "labels": ops })
}
