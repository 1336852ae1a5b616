pub mod auth;
pub mod client;
pub mod comments;
pub mod types;

pub use client::{GitHubClient, SourceHost};
pub use comments::{ValidationResult, compose_comment_body, comment_marker, sync_comments_for_pr};
pub use types::{ChangedFile, Commit, CommitDetail, PrComment, PullRequestInfo, RepoRef, Signature};
