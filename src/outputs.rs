use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::env::optional_env;

/// Step outputs for downstream pipeline steps.
///
/// Values are appended to the file named by `$GITHUB_OUTPUT` using the
/// multi-line `name<<delimiter` syntax, and always kept in memory so callers
/// (and tests) can inspect them.
#[derive(Debug, Default)]
pub struct OutputWriter {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl OutputWriter {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            values: BTreeMap::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(optional_env("GITHUB_OUTPUT").map(PathBuf::from))
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        tracing::info!("output {name}={value}");
        if let Some(path) = &self.path {
            append_output(path, name, &value)?;
        }
        self.values.insert(name.to_owned(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

fn append_output(path: &Path, name: &str, value: &str) -> Result<()> {
    let delimiter = delimiter_for(value);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening output file {}", path.display()))?;
    write!(file, "{name}<<{delimiter}\n{value}\n{delimiter}\n")
        .with_context(|| format!("writing output {name}"))
}

/// A heredoc delimiter that does not occur in `value`.
fn delimiter_for(value: &str) -> String {
    let mut delimiter = String::from("ci_dispatch_EOF");
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    delimiter
}
