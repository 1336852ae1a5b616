//! Command dispatch: `(command, subcommand)` pairs resolve to a closed set of
//! handlers.

pub mod github;
pub mod jira;
pub mod slack;
pub mod text;
pub mod version;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::config::types::AppConfig;
use crate::inputs::{self, typed_args};
use crate::jira::LoadOptions;
use crate::outputs::OutputWriter;
use crate::services::Services;

/// Everything a handler may touch.
pub struct Context<'a> {
    pub services: &'a dyn Services,
    pub config: &'a AppConfig,
    pub outputs: &'a mut OutputWriter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    JiraUpdateStatus,
    JiraAddComment,
    JiraUpdateLabels,
    JiraAssignToRelease,
    GithubPrCommenter,
    GithubGetDiffData,
    GithubCommitInfo,
    TextGetIssues,
    VersionParse,
    VersionCreateDateVersion,
    VersionExtract,
    VersionUpdate,
    SlackAlert,
    SlackE2eNotification,
}

impl Command {
    pub const ALL: [Command; 14] = [
        Command::JiraUpdateStatus,
        Command::JiraAddComment,
        Command::JiraUpdateLabels,
        Command::JiraAssignToRelease,
        Command::GithubPrCommenter,
        Command::GithubGetDiffData,
        Command::GithubCommitInfo,
        Command::TextGetIssues,
        Command::VersionParse,
        Command::VersionCreateDateVersion,
        Command::VersionExtract,
        Command::VersionUpdate,
        Command::SlackAlert,
        Command::SlackE2eNotification,
    ];

    pub fn resolve(command: &str, subcommand: &str) -> Option<Self> {
        let resolved = match (command, subcommand) {
            ("jira", "update-status") => Command::JiraUpdateStatus,
            ("jira", "add-comment") => Command::JiraAddComment,
            ("jira", "update-labels") => Command::JiraUpdateLabels,
            ("jira", "assign-to-release") => Command::JiraAssignToRelease,
            // Older workflows still call the commenter under `jira`.
            ("github", "pr-commenter") | ("jira", "issue-pr-commenter") => {
                Command::GithubPrCommenter
            }
            ("github", "get-diff-data") | ("git", "get-diff-data") => Command::GithubGetDiffData,
            ("github", "commit-info") => Command::GithubCommitInfo,
            ("text", "get-issues") => Command::TextGetIssues,
            ("version", "parse") => Command::VersionParse,
            ("version", "create-date-version") => Command::VersionCreateDateVersion,
            ("version", "extract") => Command::VersionExtract,
            ("version", "update") => Command::VersionUpdate,
            ("slack", "alert") => Command::SlackAlert,
            ("slack", "e2e-notification") => Command::SlackE2eNotification,
            _ => return None,
        };
        Some(resolved)
    }

    pub fn names(self) -> (&'static str, &'static str) {
        match self {
            Command::JiraUpdateStatus => ("jira", "update-status"),
            Command::JiraAddComment => ("jira", "add-comment"),
            Command::JiraUpdateLabels => ("jira", "update-labels"),
            Command::JiraAssignToRelease => ("jira", "assign-to-release"),
            Command::GithubPrCommenter => ("github", "pr-commenter"),
            Command::GithubGetDiffData => ("github", "get-diff-data"),
            Command::GithubCommitInfo => ("github", "commit-info"),
            Command::TextGetIssues => ("text", "get-issues"),
            Command::VersionParse => ("version", "parse"),
            Command::VersionCreateDateVersion => ("version", "create-date-version"),
            Command::VersionExtract => ("version", "extract"),
            Command::VersionUpdate => ("version", "update"),
            Command::SlackAlert => ("slack", "alert"),
            Command::SlackE2eNotification => ("slack", "e2e-notification"),
        }
    }

    pub async fn execute(self, ctx: &mut Context<'_>, args: &JsonValue) -> Result<()> {
        match self {
            Command::JiraUpdateStatus => jira::update_status(ctx, typed_args(args)?).await,
            Command::JiraAddComment => jira::add_comment(ctx, typed_args(args)?).await,
            Command::JiraUpdateLabels => jira::update_labels(ctx, typed_args(args)?).await,
            Command::JiraAssignToRelease => {
                jira::assign_to_release(ctx, typed_args(args)?).await
            }
            Command::GithubPrCommenter => github::pr_commenter(ctx, typed_args(args)?).await,
            Command::GithubGetDiffData => github::get_diff_data(ctx, typed_args(args)?).await,
            Command::GithubCommitInfo => github::commit_info(ctx, typed_args(args)?).await,
            Command::TextGetIssues => text::get_issues(ctx, typed_args(args)?),
            Command::VersionParse => version::parse(ctx, typed_args(args)?),
            Command::VersionCreateDateVersion => {
                version::create_date_version(ctx, chrono::Utc::now())
            }
            Command::VersionExtract => version::extract(ctx, typed_args(args)?),
            Command::VersionUpdate => version::update(ctx, typed_args(args)?),
            Command::SlackAlert => slack::alert(ctx, typed_args(args)?).await,
            Command::SlackE2eNotification => {
                slack::e2e_notification(ctx, typed_args(args)?).await
            }
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (command, subcommand) = self.names();
        write!(f, "{command} {subcommand}")
    }
}

/// Resolve and run one handler. Unknown pairs are logged and succeed.
pub async fn dispatch(
    ctx: &mut Context<'_>,
    command: &str,
    subcommand: &str,
    args: &JsonValue,
) -> Result<()> {
    let Some(handler) = Command::resolve(command, subcommand) else {
        tracing::warn!("No handler found for command \"{command}\" and subcommand \"{subcommand}\".");
        return Ok(());
    };
    tracing::debug!("dispatching {handler}");
    handler.execute(ctx, args).await
}

// ---------------------------------------------------------------------------
// Shared argument pieces
// ---------------------------------------------------------------------------

/// Which issues a handler applies to.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueScope {
    #[serde(default, deserialize_with = "inputs::string_list")]
    pub issues: Vec<String>,
    #[serde(default, deserialize_with = "inputs::flag")]
    pub apply_to_parent: Option<bool>,
    #[serde(default, deserialize_with = "inputs::flag")]
    pub apply_to_subtasks: Option<bool>,
}

impl IssueScope {
    /// Load options, defaulting to "no parents" and the given subtask policy.
    pub fn load_options(&self, subtasks_by_default: bool) -> LoadOptions {
        LoadOptions {
            load_parent: self.apply_to_parent.unwrap_or(false),
            skip_subtasks: !self.apply_to_subtasks.unwrap_or(subtasks_by_default),
        }
    }
}

/// `None` for missing or blank strings.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_resolves_from_its_names() {
        for command in Command::ALL {
            let (name, sub) = command.names();
            assert_eq!(Command::resolve(name, sub), Some(command));
        }
    }

    #[test]
    fn legacy_commenter_alias() {
        assert_eq!(
            Command::resolve("jira", "issue-pr-commenter"),
            Some(Command::GithubPrCommenter)
        );
    }

    #[test]
    fn git_diff_data_alias() {
        assert_eq!(
            Command::resolve("git", "get-diff-data"),
            Some(Command::GithubGetDiffData)
        );
    }

    #[test]
    fn unknown_pairs_do_not_resolve() {
        assert_eq!(Command::resolve("jira", "delete-everything"), None);
        assert_eq!(Command::resolve("", ""), None);
    }

    #[test]
    fn scope_defaults() {
        let scope = IssueScope::default();
        assert_eq!(
            scope.load_options(true),
            LoadOptions {
                load_parent: false,
                skip_subtasks: false
            }
        );
        assert!(scope.load_options(false).skip_subtasks);
    }
}
