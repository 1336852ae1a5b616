use anyhow::Result;

use crate::config::env::require_env;

/// Basic-auth credentials for the Jira REST API.
#[derive(Clone)]
pub struct JiraCredentials {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for JiraCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraCredentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl JiraCredentials {
    /// Read `ATLASSIAN_API_USERNAME` and `ATLASSIAN_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let [username, token] = require_env(["ATLASSIAN_API_USERNAME", "ATLASSIAN_API_TOKEN"])?;
        Ok(Self { username, token })
    }
}
