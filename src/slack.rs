use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

pub const DEFAULT_API_URL: &str = "https://slack.com/api";

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<()>;
}

/// Slack Web API client authenticated with a bot token.
pub struct SlackClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackClient {
    pub fn new(api_url: &str, token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ci-dispatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building Slack HTTP client")?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_owned(),
            token,
        })
    }
}

#[async_trait]
impl ChatClient for SlackClient {
    async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        tracing::debug!("sending message to Slack channel {channel}");
        let payload = serde_json::json!({ "channel": channel, "text": text });
        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.api_url))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .context("posting Slack message")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Slack API returned {status}: {body}");
        }

        // Slack reports most failures as 200 with `ok: false`.
        let parsed: SlackResponse = response
            .json()
            .await
            .context("decoding Slack response")?;
        if !parsed.ok {
            bail!(
                "Slack API error: {}",
                parsed.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Incoming webhooks
// ---------------------------------------------------------------------------

/// Posts Block Kit payloads to Slack incoming webhooks.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn post_webhook(&self, url: &str, payload: &JsonValue) -> Result<()>;
}

pub struct SlackWebhook {
    http: reqwest::Client,
}

impl SlackWebhook {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ci-dispatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building Slack webhook client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl WebhookClient for SlackWebhook {
    async fn post_webhook(&self, url: &str, payload: &JsonValue) -> Result<()> {
        // Webhook URLs embed their secret; only the prefix is logged.
        let prefix: String = url.chars().take(40).collect();
        tracing::debug!("posting to Slack webhook {prefix}...");
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .context("posting to Slack webhook")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Slack webhook request failed: {status}. Response: {body}");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Message formatting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
}

impl TestOutcome {
    /// `pass`/`success` or `fail`/`failure`, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pass" | "success" => Some(Self::Passed),
            "fail" | "failure" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One end-to-end test run, as reported to Slack.
#[derive(Debug, Clone, Default)]
pub struct E2eReport {
    pub test_name: String,
    pub total_tests: Option<u64>,
    pub test_framework: Option<String>,
    pub branch: Option<String>,
    pub author: Option<String>,
    pub repository: Option<String>,
    pub version: Option<String>,
    pub docker_image: Option<String>,
    pub build_number: Option<String>,
    pub slack_channel: Option<String>,
    pub alert_channel: Option<String>,
    pub commit_message: Option<String>,
    pub test_result_url: Option<String>,
    pub build_url: Option<String>,
    pub source_url: Option<String>,
}

/// Block Kit payload: header, a section of fields, the commit message and
/// one button section per link.
pub fn e2e_message(report: &E2eReport, outcome: TestOutcome) -> JsonValue {
    let (emoji, status) = match outcome {
        TestOutcome::Passed => ("✅", "PASSED"),
        TestOutcome::Failed => ("❌", "FAILED"),
    };
    let header = format!("{emoji} E2E Test {status}: {}", report.test_name);

    let mut fields = vec![mrkdwn("Test Result", status)];
    let total = report.total_tests.map(|n| n.to_string());
    let channel = |name: &Option<String>| {
        name.as_deref()
            .map(|c| format!("#{}", c.trim_start_matches('#')))
    };
    let optional = [
        ("Total Tests", total),
        ("Test Framework", report.test_framework.clone()),
        ("Branch", report.branch.clone()),
        ("Author", report.author.clone()),
        ("Repository", report.repository.clone()),
        ("Version", report.version.clone()),
        ("Docker Image", report.docker_image.clone()),
        ("Build Number", report.build_number.clone()),
        ("Slack Channel", channel(&report.slack_channel)),
        ("Alert Channel", channel(&report.alert_channel)),
    ];
    for (label, value) in optional {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            fields.push(mrkdwn(label, &value));
        }
    }

    let mut blocks = vec![
        json!({ "type": "header", "text": { "type": "plain_text", "text": header } }),
        json!({ "type": "section", "fields": fields }),
    ];
    if let Some(message) = report.commit_message.as_deref().filter(|m| !m.is_empty()) {
        blocks.push(json!({ "type": "section", "text": mrkdwn("Commit Message", message) }));
    }
    let links = [
        ("View Test Results", &report.test_result_url),
        ("View Build", &report.build_url),
        ("View Source", &report.source_url),
    ];
    for (label, url) in links {
        if let Some(url) = url.as_deref().filter(|u| !u.is_empty()) {
            blocks.push(json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": " " },
                "accessory": {
                    "type": "button",
                    "text": { "type": "plain_text", "text": label },
                    "url": url,
                },
            }));
        }
    }

    json!({ "text": header, "blocks": blocks })
}

fn mrkdwn(label: &str, value: &str) -> JsonValue {
    json!({ "type": "mrkdwn", "text": format!("*{label}:*\n{value}") })
}

/// Alert text: bold title line, blank line, message.
pub fn format_alert(title: Option<&str>, message: &str) -> String {
    match title.filter(|t| !t.is_empty()) {
        Some(title) => format!("*{title}*\n\n{message}"),
        None => message.to_owned(),
    }
}
