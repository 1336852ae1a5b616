use crate::jira::client::IssueTracker;
use crate::jira::error::TrackerError;
use crate::jira::types::{Issue, Transition};
use crate::jira::{adf, edit};
use crate::text::normalize;

/// Status category key marking a terminal status in Jira.
pub const DONE_CATEGORY: &str = "done";

/// Find the transition whose canonical name equals the canonical `target`.
pub async fn find_transition(
    tracker: &dyn IssueTracker,
    key: &str,
    target: &str,
) -> Result<Transition, TrackerError> {
    let transitions = tracker.list_transitions(key).await?;
    let wanted = normalize(target);
    if let Some(found) = transitions.iter().find(|t| normalize(&t.name) == wanted) {
        return Ok(found.clone());
    }
    Err(TrackerError::TransitionNotFound {
        key: key.to_owned(),
        target: target.to_owned(),
        available: transitions.into_iter().map(|t| t.name).collect(),
    })
}

pub async fn apply_transition(
    tracker: &dyn IssueTracker,
    key: &str,
    transition: &Transition,
) -> Result<(), TrackerError> {
    tracing::info!(
        "moving issue {key} to \"{}\" (transition {})",
        transition.name,
        transition.id
    );
    tracker.apply_transition(key, &transition.id).await
}

/// What the caller asked for, shared read-only across a fan-out.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub target_status: String,
    /// Markdown comment added after a successful transition.
    pub comment: Option<String>,
    /// Statuses that are never moved away from.
    pub ignore_statuses: Vec<String>,
    pub done_category: String,
}

impl StatusUpdate {
    pub fn new(target_status: impl Into<String>) -> Self {
        Self {
            target_status: target_status.into(),
            comment: None,
            ignore_statuses: Vec::new(),
            done_category: DONE_CATEGORY.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Ignored { status: String },
    AlreadyDone { status: String },
    AlreadyAtTarget { status: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ignored { status } => write!(f, "status \"{status}\" is on the ignore list"),
            Self::AlreadyDone { status } => write!(f, "status \"{status}\" is already done"),
            Self::AlreadyAtTarget { status } => {
                write!(f, "status \"{status}\" already matches the target")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Skipped(SkipReason),
    Transitioned { transition_id: String },
}

/// Decide whether `issue` should move, without touching the remote.
///
/// Rules are checked in order; the first match wins.
pub fn skip_reason(issue: &Issue, update: &StatusUpdate) -> Option<SkipReason> {
    let current = normalize(&issue.status.name);
    let status = issue.status.name.clone();

    if update
        .ignore_statuses
        .iter()
        .any(|ignored| normalize(ignored) == current)
    {
        return Some(SkipReason::Ignored { status });
    }
    if issue.status.category == update.done_category {
        return Some(SkipReason::AlreadyDone { status });
    }
    if current == normalize(&update.target_status) {
        return Some(SkipReason::AlreadyAtTarget { status });
    }
    None
}

/// Move one issue towards the requested status, then comment on it.
///
/// A comment failure after a successful transition is returned as an error;
/// the transition stays applied.
pub async fn update_issue_status(
    tracker: &dyn IssueTracker,
    issue: &Issue,
    update: &StatusUpdate,
) -> Result<StatusOutcome, TrackerError> {
    if let Some(reason) = skip_reason(issue, update) {
        tracing::info!("skipping status update of {}: {reason}", issue.key);
        return Ok(StatusOutcome::Skipped(reason));
    }

    let comment = match update.comment.as_deref() {
        Some(markdown) => Some(adf::from_markdown_checked(markdown)?),
        None => None,
    };

    let transition = find_transition(tracker, &issue.key, &update.target_status).await?;
    apply_transition(tracker, &issue.key, &transition).await?;

    if let Some(doc) = comment {
        edit::add_comment_document(tracker, &issue.key, &doc).await?;
    }

    Ok(StatusOutcome::Transitioned {
        transition_id: transition.id,
    })
}
