//! Handler arguments as supplied by the pipeline.
//!
//! Workflow inputs arrive as loosely typed JSON: issue lists may be arrays or
//! comma-separated strings, flags may be `true`, `"true"` or `1`, PR numbers
//! may be strings. The deserializers here accept all of those shapes.

use anyhow::{Context, Result, bail};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

/// Parse the raw `args` blob. Empty input yields an empty object.
pub fn parse_args(raw: &str) -> Result<JsonValue> {
    if raw.trim().is_empty() {
        return Ok(JsonValue::Object(Map::new()));
    }
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(value @ JsonValue::Object(_)) => Ok(value),
        Ok(_) | Err(_) => {
            tracing::debug!("raw args string: {raw}");
            bail!("Invalid args format. Expected a JSON string.")
        }
    }
}

/// Deserialize handler-specific arguments from the parsed blob.
pub fn typed_args<T: DeserializeOwned>(args: &JsonValue) -> Result<T> {
    T::deserialize(args).context("invalid arguments")
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListInput {
    List(Vec<String>),
    Text(String),
}

/// `["A-1", "A-2"]` or `"A-1, A-2"`.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ListInput>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ListInput::List(items)) => items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        Some(ListInput::Text(text)) => split_list(&text),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagInput {
    Bool(bool),
    Number(i64),
    Text(String),
}

/// `true`, `"true"` and `1` are true; `false`, `"false"`, `0` and `""` are
/// false; anything else is an error.
pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlagInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FlagInput::Bool(b)) => Ok(Some(b)),
        Some(FlagInput::Number(1)) => Ok(Some(true)),
        Some(FlagInput::Number(0)) => Ok(Some(false)),
        Some(FlagInput::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" | "" => Ok(Some(false)),
            other => Err(de::Error::custom(format!("invalid boolean flag {other:?}"))),
        },
        Some(FlagInput::Number(n)) => Err(de::Error::custom(format!("invalid boolean flag {n}"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberInput {
    Number(u64),
    Text(String),
}

/// `123` or `"123"`; an empty string counts as absent.
pub fn pr_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    number(deserializer, "PR number")
}

/// Same shapes as [`pr_number`], for counts such as test totals.
pub fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    number(deserializer, "count")
}

fn number<'de, D>(deserializer: D, what: &str) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberInput::Number(n)) => Ok(Some(n)),
        Some(NumberInput::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberInput::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid {what} {text:?}"))),
    }
}
