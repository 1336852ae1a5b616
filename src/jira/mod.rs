pub mod adf;
pub mod auth;
pub mod client;
pub mod edit;
pub mod error;
pub mod fanout;
pub mod issues;
pub mod status;
pub mod types;

pub use client::{IssueTracker, JiraClient};
pub use error::TrackerError;
pub use fanout::{FanOutReport, for_each_issue};
pub use issues::{LoadOptions, fetch_issue, load_issues, resolve_to_parent};
pub use status::{StatusOutcome, StatusUpdate, update_issue_status};
pub use types::{Issue, IssueStatus, IssueType, Transition};
