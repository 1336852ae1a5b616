use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::env::optional_env;
use crate::config::types::AppConfig;

const REPO_CONFIG_NAME: &str = ".ci-dispatch.toml";

/// Discover and load the app config, then apply environment overrides.
///
/// Priority:
/// 1. `--config` flag / `INPUT_CONFIG` (explicit path)
/// 2. `$CI_DISPATCH_CONFIG`
/// 3. `.ci-dispatch.toml` between the current directory and the Git root
///
/// Without any file, defaults are used. Environment variables set by the
/// runner (`ATLASSIAN_API_BASE_URL`, `GITHUB_REPOSITORY`, `GITHUB_API_URL`)
/// always win over file values.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_env_config().or_else(find_repo_local_config),
    };

    let config = match path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            read_config(&path)?
        }
        None => AppConfig::default(),
    };

    Ok(apply_env_overrides(config, optional_env))
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing TOML from {}", path.display()))
}

/// Overlay runner-provided variables, looked up through `lookup`.
pub fn apply_env_overrides(
    mut config: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> AppConfig {
    if let Some(url) = lookup("ATLASSIAN_API_BASE_URL") {
        config.jira.base_url = Some(url);
    }
    if let Some(repo) = lookup("GITHUB_REPOSITORY") {
        config.github.repository = Some(repo);
    }
    if let Some(url) = lookup("GITHUB_API_URL") {
        config.github.api_url = Some(url);
    }
    config
}

fn find_env_config() -> Option<PathBuf> {
    let path = PathBuf::from(optional_env("CI_DISPATCH_CONFIG")?);
    path.is_file().then_some(path)
}

fn find_repo_local_config() -> Option<PathBuf> {
    // Walk up from CWD looking for the config, stopping at the Git root.
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(REPO_CONFIG_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").exists() {
            return None;
        }
        if !dir.pop() {
            return None;
        }
    }
}
