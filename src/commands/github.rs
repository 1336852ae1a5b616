use anyhow::{Context as _, Result, bail};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use super::{Context, IssueScope, non_empty};
use crate::github::{RepoRef, Signature, ValidationResult, sync_comments_for_pr};
use crate::inputs;
use crate::jira::load_issues;
use crate::outputs::OutputWriter;
use crate::text::{infer_issues, sanitize_non_printable};

const DEFAULT_TITLE_PATTERN: &str = ".*";
const DEFAULT_DATA_SEPARATOR: &str = "\n";

// ---------------------------------------------------------------------------
// github pr-commenter
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrCommenterArgs {
    #[serde(flatten)]
    pub scope: IssueScope,
    #[serde(default, deserialize_with = "inputs::pr_number")]
    pub pr_number: Option<u64>,
    #[serde(default)]
    pub pr_title_regex: Option<String>,
    #[serde(default, deserialize_with = "inputs::flag")]
    pub fail_when_no_issues: Option<bool>,
    /// Validation outcomes produced by an earlier pipeline step.
    #[serde(default)]
    pub results: Vec<ValidationResult>,
}

/// Post (or refresh) one validation comment per loaded issue on a PR, then
/// fail when any issue did not pass validation.
pub async fn pr_commenter(ctx: &mut Context<'_>, args: PrCommenterArgs) -> Result<()> {
    let Some(pr_number) = args.pr_number else {
        info!("No PR number provided, skipping PR comments.");
        return Ok(());
    };
    let fail_when_no_issues = args.fail_when_no_issues.unwrap_or(false);

    let title_pattern =
        non_empty(args.pr_title_regex).unwrap_or_else(|| DEFAULT_TITLE_PATTERN.to_owned());
    let title_re = Regex::new(&title_pattern)
        .with_context(|| format!("invalid PR title pattern {title_pattern:?}"))?;

    let host = ctx.services.source_host()?;
    let pr = host.pull_request(pr_number).await?;
    if let Some(title) = pr.title.as_deref()
        && !title_re.is_match(title)
    {
        info!("PR title \"{title}\" does not match {title_pattern}, skipping PR comments.");
        return Ok(());
    }

    if args.scope.issues.is_empty() {
        return no_issues(fail_when_no_issues, "No issues provided.");
    }

    let tracker = ctx.services.issue_tracker()?;
    let issues = load_issues(
        tracker.as_ref(),
        &args.scope.issues,
        args.scope.load_options(false),
        &ctx.config.jira.fields,
    )
    .await;
    if issues.is_empty() {
        return no_issues(fail_when_no_issues, "No issues could be loaded.");
    }

    let mut selected: Vec<ValidationResult> = Vec::with_capacity(issues.len());
    for issue in &issues {
        // Loading with parents can yield the same issue twice.
        if selected.iter().any(|r| r.issue.key == issue.key) {
            continue;
        }
        match args.results.iter().find(|r| r.issue.key == issue.key) {
            Some(result) => selected.push(result.clone()),
            None => warn!("no validation result for issue {}", issue.key),
        }
    }

    let failed_syncs = sync_comments_for_pr(host.as_ref(), pr_number, &selected).await;

    let mut failed: Vec<&str> = Vec::new();
    for result in selected.iter().filter(|r| r.is_error()) {
        if !failed.contains(&result.issue.key.as_str()) {
            failed.push(&result.issue.key);
        }
    }
    ctx.outputs.set("failedIssues", failed.join(","))?;

    if !failed_syncs.is_empty() {
        bail!(
            "Failed to sync PR comments for issues: {}",
            failed_syncs.join(", ")
        );
    }
    if !failed.is_empty() {
        bail!("Validation failed for issues: {}", failed.join(", "));
    }
    Ok(())
}

fn no_issues(fail: bool, message: &str) -> Result<()> {
    if fail {
        bail!("{message} failWhenNoIssues is set to true.");
    }
    info!("{message}");
    Ok(())
}

// ---------------------------------------------------------------------------
// github get-diff-data
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffDataArgs {
    #[serde(default, deserialize_with = "inputs::pr_number")]
    pub pr_number: Option<u64>,
    #[serde(default)]
    pub issue_pattern: Option<String>,
    /// Joins the commit messages; a newline by default.
    #[serde(default)]
    pub data_separator: Option<String>,
}

/// Emit a PR's commit messages, changed files and the issue keys mentioned in
/// its title, body and commits.
pub async fn get_diff_data(ctx: &mut Context<'_>, args: DiffDataArgs) -> Result<()> {
    let Some(pr_number) = args.pr_number else {
        info!("No PR number provided, skipping diff data.");
        return Ok(());
    };
    let separator = args
        .data_separator
        .unwrap_or_else(|| DEFAULT_DATA_SEPARATOR.to_owned());

    let host = ctx.services.source_host()?;
    let (pr, commits, files) = futures::try_join!(
        host.pull_request(pr_number),
        host.pull_request_commits(pr_number),
        host.pull_request_files(pr_number)
    )?;

    let commit_messages = commits
        .iter()
        .map(|c| format!("- {}", c.commit.message))
        .collect::<Vec<_>>()
        .join(&separator);
    let filenames: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();

    let mut issues: Vec<String> = Vec::new();
    if let Some(pattern) = non_empty(args.issue_pattern) {
        let sources = [
            pr.title.as_deref().unwrap_or_default(),
            pr.body.as_deref().unwrap_or_default(),
            commit_messages.as_str(),
        ];
        for text in sources {
            for key in infer_issues(text, &pattern)? {
                if !issues.contains(&key) {
                    issues.push(key);
                }
            }
        }
    }

    ctx.outputs.set("commit-messages", commit_messages)?;
    ctx.outputs.set("files", filenames.join(","))?;
    ctx.outputs.set("issues", issues.join(","))
}

// ---------------------------------------------------------------------------
// github commit-info
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CommitInfoArgs {
    #[serde(default)]
    pub sha: Option<String>,
    /// `owner/repo`; the pipeline's repository by default.
    #[serde(default)]
    pub repo: Option<String>,
}

/// Emit message, author, committer and URL of one commit.
pub async fn commit_info(ctx: &mut Context<'_>, args: CommitInfoArgs) -> Result<()> {
    let Some(sha) = non_empty(args.sha) else {
        bail!("Commit SHA is required");
    };
    let own_repo = ctx.config.github.repository.as_deref();
    let Some(repo) = non_empty(args.repo).or_else(|| own_repo.map(str::to_owned)) else {
        bail!("Repository is required (either via args.repo or GITHUB_REPOSITORY env var)");
    };
    let other_repo = if Some(repo.as_str()) == own_repo {
        None
    } else {
        let parsed = RepoRef::parse(&repo).with_context(|| {
            format!("invalid repository format: {repo}. Expected format: owner/repo")
        })?;
        Some(parsed)
    };
    tracing::debug!("fetching commit info for {sha} in {repo}");

    let host = ctx.services.source_host()?;
    let commit = host
        .commit(other_repo.as_ref(), &sha)
        .await
        .context("Error fetching commit info")?;

    let message = &commit.commit.message;
    let author = commit.commit.author.clone().unwrap_or_default();
    let committer = commit.commit.committer.clone().unwrap_or_default();
    let outputs = &mut *ctx.outputs;
    outputs.set("message-original", message.as_str())?;
    outputs.set("message", sanitize_non_printable(message, " "))?;
    set_signature(outputs, "author", author)?;
    set_signature(outputs, "committer", committer)?;
    outputs.set("sha", commit.sha.as_str())?;
    outputs.set("url", commit.html_url.clone().unwrap_or_default())?;
    info!("Successfully retrieved commit info for {sha}");
    Ok(())
}

fn set_signature(outputs: &mut OutputWriter, role: &str, signature: Signature) -> Result<()> {
    outputs.set(&format!("{role}-name"), signature.name.unwrap_or_default())?;
    outputs.set(&format!("{role}-email"), signature.email.unwrap_or_default())?;
    outputs.set(&format!("{role}-date"), signature.date.unwrap_or_default())
}
