use anyhow::{Result, bail};
use serde::Deserialize;
use tracing::info;

use super::{Context, non_empty};
use crate::inputs;
use crate::text::infer_issues;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIssuesArgs {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub issue_pattern: Option<String>,
    #[serde(default, deserialize_with = "inputs::flag")]
    pub fail_when_no_issues: Option<bool>,
}

/// Extract issue keys from free text into the `issues` output.
pub fn get_issues(ctx: &mut Context<'_>, args: GetIssuesArgs) -> Result<()> {
    let Some(text) = non_empty(args.text) else {
        info!("No text provided, skipping issue extraction.");
        return Ok(());
    };
    let Some(pattern) = non_empty(args.issue_pattern) else {
        bail!("Issue pattern is required");
    };

    let issues = infer_issues(&text, &pattern)?;
    if issues.is_empty() {
        if args.fail_when_no_issues.unwrap_or(false) {
            bail!("No issues found and failWhenNoIssues is set to true.");
        }
        info!("No issues found in text.");
        return Ok(());
    }
    info!("Found issues: {}", issues.join(", "));
    ctx.outputs.set("issues", issues.join(","))
}
