use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Datelike, Timelike, Utc};
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;

const SECONDS_IN_DAY: u32 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Dot-separated prerelease identifiers.
    pub pre: Vec<String>,
    pub build: Option<String>,
}

/// Parse a strict semantic version, with an optional leading `v`. Returns
/// `None` for anything else.
pub fn parse_version(version: &str) -> Option<ParsedVersion> {
    let raw = version.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    let parsed = semver::Version::parse(raw).ok()?;
    Some(ParsedVersion {
        major: parsed.major,
        minor: parsed.minor,
        patch: parsed.patch,
        pre: if parsed.pre.is_empty() {
            Vec::new()
        } else {
            parsed.pre.as_str().split('.').map(str::to_owned).collect()
        },
        build: (!parsed.build.is_empty()).then(|| parsed.build.to_string()),
    })
}

impl ParsedVersion {
    /// `major.minor.patch`, with `-pre` when there is one.
    pub fn core_with_pre(&self) -> String {
        let core = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if self.pre.is_empty() {
            core
        } else {
            format!("{core}-{}", self.pre.join("."))
        }
    }
}

/// Fraction of the day elapsed, scaled to `0..=999`.
pub fn time_of_day_number(dt: &DateTime<Utc>) -> u32 {
    let since_midnight = dt.num_seconds_from_midnight();
    (since_midnight * 999).div_ceil(SECONDS_IN_DAY).min(999)
}

/// [`time_of_day_number`], zero-padded to three digits.
pub fn time_of_day_code(dt: &DateTime<Utc>) -> String {
    format!("{:03}", time_of_day_number(dt))
}

/// Date-based build version: `YYMMDD` followed by the time-of-day code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateVersion {
    pub year: String,
    pub month: String,
    pub day: String,
    pub time_of_day: String,
}

impl DateVersion {
    pub fn at(dt: &DateTime<Utc>) -> Self {
        Self {
            year: format!("{:02}", dt.year().rem_euclid(100)),
            month: format!("{:02}", dt.month()),
            day: format!("{:02}", dt.day()),
            time_of_day: time_of_day_code(dt),
        }
    }

    pub fn version(&self) -> String {
        format!("{}{}{}{}", self.year, self.month, self.day, self.time_of_day)
    }
}

// ---------------------------------------------------------------------------
// Version files
// ---------------------------------------------------------------------------

const SUPPORTED_EXTENSIONS: &str = ".json, .yaml, .yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFileFormat {
    Json,
    Yaml,
}

impl VersionFileFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            bail!(
                "Invalid file name: {}, missing extension. Currently supported extensions are: {SUPPORTED_EXTENSIONS}",
                path.display()
            );
        };
        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => bail!(
                "Unsupported file extension: .{other}. Currently supported extensions are: {SUPPORTED_EXTENSIONS}"
            ),
        }
    }
}

/// Read the string at a dot-separated `attribute` path (`package.version`).
/// `Ok(None)` when the path is missing or does not hold a non-empty string.
pub fn read_version_attribute(path: &Path, attribute: &str) -> Result<Option<String>> {
    let format = VersionFileFormat::from_path(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let document: JsonValue = match format {
        VersionFileFormat::Json => serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON file: {}", path.display()))?,
        VersionFileFormat::Yaml => serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML file: {}", path.display()))?,
    };
    let value = attribute
        .split('.')
        .try_fold(&document, |value, key| value.get(key))
        .and_then(JsonValue::as_str)
        .filter(|v| !v.is_empty());
    Ok(value.map(str::to_owned))
}

/// Write `version` at `attribute`, in place.
///
/// JSON files are re-serialized with two-space indentation and their key
/// order kept; a missing top-level attribute is added. YAML files are edited
/// line by line so comments and layout survive: every `key: value` line whose
/// key is the last segment of `attribute` gets the new value.
pub fn write_version_attribute(path: &Path, attribute: &str, version: &str) -> Result<()> {
    let format = VersionFileFormat::from_path(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let updated = match format {
        VersionFileFormat::Json => set_json_attribute(&content, attribute, version),
        VersionFileFormat::Yaml => set_yaml_attribute(&content, attribute, version),
    }
    .with_context(|| format!("failed to update {}", path.display()))?;
    fs::write(path, updated).with_context(|| format!("failed to write {}", path.display()))
}

fn set_json_attribute(content: &str, attribute: &str, version: &str) -> Result<String> {
    let mut document: JsonValue = serde_json::from_str(content).context("invalid JSON")?;
    let pointer: String = attribute
        .split('.')
        .map(|key| format!("/{}", key.replace('~', "~0").replace('/', "~1")))
        .collect();
    match document.pointer_mut(&pointer) {
        Some(slot) => *slot = JsonValue::String(version.to_owned()),
        None => match document.as_object_mut() {
            Some(root) if !attribute.contains('.') => {
                root.insert(attribute.to_owned(), JsonValue::String(version.to_owned()));
            }
            _ => bail!("Version attribute \"{attribute}\" not found"),
        },
    }
    let mut out = serde_json::to_string_pretty(&document)?;
    if content.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

fn set_yaml_attribute(content: &str, attribute: &str, version: &str) -> Result<String> {
    let key = attribute.rsplit('.').next().unwrap_or(attribute);
    let re = Regex::new(&format!(r"(?m)^([ \t]*{}[ \t]*:[ \t]*)\S.*$", regex::escape(key)))
        .context("building attribute pattern")?;
    if !re.is_match(content) {
        bail!("Version attribute \"{attribute}\" not found");
    }
    let updated = re.replace_all(content, |caps: &Captures<'_>| format!("{}{version}", &caps[1]));
    Ok(updated.into_owned())
}
