use anyhow::Result;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{Context, IssueScope, non_empty};
use crate::inputs;
use crate::jira::{FanOutReport, StatusUpdate, edit, for_each_issue, update_issue_status};
use crate::outputs::OutputWriter;

// ---------------------------------------------------------------------------
// jira update-status
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusArgs {
    #[serde(flatten)]
    pub scope: IssueScope,
    #[serde(default)]
    pub target_status: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "inputs::string_list")]
    pub ignore_statuses: Vec<String>,
}

pub async fn update_status(ctx: &mut Context<'_>, args: UpdateStatusArgs) -> Result<()> {
    if args.scope.issues.is_empty() {
        info!("No issues provided, skipping status update.");
        return Ok(());
    }
    let Some(target_status) = non_empty(args.target_status) else {
        info!("No target status provided, skipping status update.");
        return Ok(());
    };

    let config = &ctx.config.jira;
    let mut update = StatusUpdate::new(target_status);
    update.comment = non_empty(args.comment);
    update.done_category = config.done_category.clone();
    update.ignore_statuses = config
        .ignore_statuses
        .iter()
        .cloned()
        .chain(args.ignore_statuses)
        .collect();

    let tracker = ctx.services.issue_tracker()?;
    let tracker = tracker.as_ref();
    let update = &update;
    let report = for_each_issue(
        tracker,
        &args.scope.issues,
        args.scope.load_options(true),
        &config.fields,
        move |issue| async move { update_issue_status(tracker, &issue, update).await },
    )
    .await;
    write_report(ctx.outputs, &report)
}

// ---------------------------------------------------------------------------
// jira add-comment
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentArgs {
    #[serde(flatten)]
    pub scope: IssueScope,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn add_comment(ctx: &mut Context<'_>, args: AddCommentArgs) -> Result<()> {
    if args.scope.issues.is_empty() {
        info!("No issues provided, skipping comment.");
        return Ok(());
    }
    let Some(comment) = non_empty(args.comment) else {
        info!("No comment provided, skipping comment.");
        return Ok(());
    };

    let tracker = ctx.services.issue_tracker()?;
    let tracker = tracker.as_ref();
    let comment = comment.as_str();
    let report = for_each_issue(
        tracker,
        &args.scope.issues,
        args.scope.load_options(true),
        &ctx.config.jira.fields,
        move |issue| async move { edit::add_comment(tracker, &issue.key, comment).await },
    )
    .await;
    write_report(ctx.outputs, &report)
}

// ---------------------------------------------------------------------------
// jira update-labels
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabelsArgs {
    #[serde(flatten)]
    pub scope: IssueScope,
    #[serde(default, deserialize_with = "inputs::string_list")]
    pub labels_to_add: Vec<String>,
    #[serde(default, deserialize_with = "inputs::string_list")]
    pub labels_to_remove: Vec<String>,
}

pub async fn update_labels(ctx: &mut Context<'_>, args: UpdateLabelsArgs) -> Result<()> {
    if args.scope.issues.is_empty() {
        info!("No issues provided, skipping label update.");
        return Ok(());
    }
    if args.labels_to_add.is_empty() && args.labels_to_remove.is_empty() {
        info!("No labels to add or remove, skipping label update.");
        return Ok(());
    }

    let operations = edit::label_operations(&args.labels_to_add, &args.labels_to_remove);
    let tracker = ctx.services.issue_tracker()?;
    let tracker = tracker.as_ref();
    let operations = &operations;
    let report = for_each_issue(
        tracker,
        &args.scope.issues,
        args.scope.load_options(true),
        &ctx.config.jira.fields,
        move |issue| async move { edit::patch_fields(tracker, &issue.key, operations).await },
    )
    .await;
    write_report(ctx.outputs, &report)
}

// ---------------------------------------------------------------------------
// jira assign-to-release
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignToReleaseArgs {
    #[serde(flatten)]
    pub scope: IssueScope,
    #[serde(default)]
    pub version: Option<String>,
}

pub async fn assign_to_release(ctx: &mut Context<'_>, args: AssignToReleaseArgs) -> Result<()> {
    if args.scope.issues.is_empty() {
        info!("No issues provided, skipping release assignment.");
        return Ok(());
    }
    let Some(version) = non_empty(args.version) else {
        info!("No version provided, skipping release assignment.");
        return Ok(());
    };

    let fields = json!({ "fixVersions": [{ "name": version }] });
    let tracker = ctx.services.issue_tracker()?;
    let tracker = tracker.as_ref();
    let fields = &fields;
    let report = for_each_issue(
        tracker,
        &args.scope.issues,
        args.scope.load_options(true),
        &ctx.config.jira.fields,
        move |issue| async move { edit::update_fields(tracker, &issue.key, fields).await },
    )
    .await;
    write_report(ctx.outputs, &report)
}

fn write_report(outputs: &mut OutputWriter, report: &FanOutReport) -> Result<()> {
    if report.is_empty() {
        info!("No issues were loaded.");
    }
    outputs.set("processedIssues", report.succeeded.join(","))?;
    outputs.set("failedIssues", report.failed.join(","))
}
