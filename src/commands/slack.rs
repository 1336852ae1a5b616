use anyhow::{Result, bail};
use serde::Deserialize;

use super::{Context, non_empty};
use crate::inputs;
use crate::slack::{E2eReport, TestOutcome, e2e_message, format_alert};

#[derive(Debug, Default, Deserialize)]
pub struct AlertArgs {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn alert(ctx: &mut Context<'_>, args: AlertArgs) -> Result<()> {
    let Some(channel) = non_empty(args.channel) else {
        bail!("Slack channel is required");
    };
    let Some(message) = non_empty(args.message) else {
        bail!("Slack message is required");
    };

    let chat = ctx.services.chat()?;
    let text = format_alert(args.title.as_deref(), &message);
    chat.post_message(&channel, &text).await?;
    tracing::info!("alert sent to Slack channel {channel}");
    Ok(())
}

// ---------------------------------------------------------------------------
// slack e2e-notification
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct E2eNotificationArgs {
    #[serde(default)]
    pub test_name: Option<String>,
    #[serde(default)]
    pub test_result: Option<String>,
    #[serde(default, deserialize_with = "inputs::count")]
    pub total_tests: Option<u64>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Used instead of `webhook_url` when the run failed.
    #[serde(default)]
    pub slack_alert_webhook_url: Option<String>,
    #[serde(default)]
    pub test_result_url: Option<String>,
    #[serde(default)]
    pub docker_image: Option<String>,
    #[serde(default)]
    pub test_framework: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub commit_message: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub build_url: Option<String>,
    #[serde(default)]
    pub build_number: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub slack_channel: Option<String>,
    #[serde(default)]
    pub slack_alert_channel: Option<String>,
}

/// Report an end-to-end test run to a Slack incoming webhook.
pub async fn e2e_notification(ctx: &mut Context<'_>, args: E2eNotificationArgs) -> Result<()> {
    let Some(test_name) = non_empty(args.test_name) else {
        bail!("Test name is required");
    };
    let Some(raw_result) = non_empty(args.test_result) else {
        bail!("Test result is required");
    };
    let Some(outcome) = TestOutcome::parse(&raw_result) else {
        bail!("Test result must be either \"pass\" or \"fail\"");
    };
    let Some(webhook_url) = non_empty(args.webhook_url) else {
        bail!("Slack webhook URL is required");
    };

    let url = match non_empty(args.slack_alert_webhook_url) {
        Some(alert_url) if outcome == TestOutcome::Failed => {
            tracing::debug!("using the alert webhook for a failed run");
            alert_url
        }
        _ => webhook_url,
    };

    let report = E2eReport {
        test_name,
        total_tests: args.total_tests,
        test_framework: args.test_framework,
        branch: args.branch,
        author: args.author,
        repository: args.repository,
        version: args.version,
        docker_image: args.docker_image,
        build_number: args.build_number,
        slack_channel: args.slack_channel,
        alert_channel: args.slack_alert_channel,
        commit_message: args.commit_message,
        test_result_url: args.test_result_url,
        build_url: args.build_url,
        source_url: args.source_url,
    };
    let payload = e2e_message(&report, outcome);

    let webhook = ctx.services.webhook()?;
    if let Err(e) = webhook.post_webhook(&url, &payload).await {
        ctx.outputs.set("notification-sent", "false")?;
        bail!("Error sending Slack notification: {e:#}");
    }
    tracing::info!(
        "Successfully sent Slack notification for E2E test: {}",
        report.test_name
    );
    ctx.outputs.set("notification-sent", "true")?;
    ctx.outputs.set("test-result", raw_result)
}
