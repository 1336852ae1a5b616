use http::StatusCode;
use thiserror::Error;

/// Errors raised by the issue tracker layer.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("issue {key} not found")]
    NotFound { key: String },

    /// Non-success response from the tracker. Never retried.
    #[error("error {operation} for issue {key}: {status}\n{body}")]
    Remote {
        operation: &'static str,
        key: String,
        status: StatusCode,
        body: String,
    },

    #[error(
        "no transition to status \"{target}\" available for issue {key} (available: {})",
        available.join(", ")
    )]
    TransitionNotFound {
        key: String,
        target: String,
        available: Vec<String>,
    },

    #[error("failed to apply transition {transition_id} to issue {key}: {status}\n{body}")]
    TransitionApply {
        key: String,
        transition_id: String,
        status: StatusCode,
        body: String,
    },

    /// Missing or malformed input, raised before any remote call.
    #[error("{0}")]
    Validation(String),

    #[error("issue tracker request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl TrackerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
