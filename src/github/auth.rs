use std::process::Command;

use anyhow::{Context, Result, bail};
use reqwest::Url;

use crate::config::env::optional_env;

/// Resolve a GitHub token for API calls from a pipeline.
///
/// `GITHUB_TOKEN` (set by Actions) wins over `GH_TOKEN`. Local runs fall back
/// to the `gh` CLI, asking it for the host behind `api_url` when that is not
/// github.com.
pub fn resolve_token(api_url: Option<&str>) -> Result<String> {
    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Some(token) = optional_env(var) {
            return Ok(token);
        }
    }

    let hostname = api_url.and_then(gh_hostname);
    match gh_cli_token(hostname.as_deref()) {
        Ok(token) => Ok(token),
        Err(e) => {
            tracing::debug!("no token from gh: {e:#}");
            bail!("GITHUB_TOKEN environment variable is required")
        }
    }
}

/// The `gh --hostname` value for an API base URL, or `None` for github.com.
///
/// Enterprise Server serves the API under `https://HOST/api/v3`; GHE.com
/// tenants use `https://api.TENANT.ghe.com`.
pub fn gh_hostname(api_url: &str) -> Option<String> {
    let url = Url::parse(api_url).ok()?;
    let host = url.host_str()?;
    let host = host.strip_prefix("api.").unwrap_or(host);
    (host != "github.com").then(|| host.to_owned())
}

fn gh_cli_token(hostname: Option<&str>) -> Result<String> {
    let mut command = Command::new("gh");
    command.args(["auth", "token"]);
    if let Some(hostname) = hostname {
        command.args(["--hostname", hostname]);
    }
    let output = command.output().context("running gh auth token")?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let token = stdout.trim();
    if !output.status.success() || token.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("gh auth token failed: {}", stderr.trim());
    }
    Ok(token.to_owned())
}
