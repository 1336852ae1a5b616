use std::path::Path;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use super::{Context, non_empty};
use crate::version::{
    DateVersion, parse_version, read_version_attribute, write_version_attribute,
};

const DEFAULT_VERSION_ATTRIBUTE: &str = "version";

#[derive(Debug, Default, Deserialize)]
pub struct ParseArgs {
    #[serde(default)]
    pub version: Option<String>,
}

/// Split a semantic version into `major`, `minor`, `patch` and `pre` outputs.
pub fn parse(ctx: &mut Context<'_>, args: ParseArgs) -> Result<()> {
    let Some(raw) = non_empty(args.version) else {
        info!("No version provided, skipping version parsing.");
        return Ok(());
    };
    let Some(version) = parse_version(&raw) else {
        bail!("Invalid version format: {raw}");
    };

    let outputs = &mut *ctx.outputs;
    outputs.set("major", version.major.to_string())?;
    outputs.set("minor", version.minor.to_string())?;
    outputs.set("patch", version.patch.to_string())?;
    outputs.set("pre", version.pre.join("."))?;
    outputs.set("build", version.build.unwrap_or_default())
}

/// Emit a date-based build version for `now`.
pub fn create_date_version(ctx: &mut Context<'_>, now: DateTime<Utc>) -> Result<()> {
    let date = DateVersion::at(&now);
    let outputs = &mut *ctx.outputs;
    outputs.set("version", date.version())?;
    outputs.set("year", date.year)?;
    outputs.set("month", date.month)?;
    outputs.set("day", date.day)?;
    outputs.set("timeOfDay", date.time_of_day)
}

// ---------------------------------------------------------------------------
// version extract / update
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractArgs {
    #[serde(default)]
    pub version_file: Option<String>,
    /// Dot-separated path, `version` by default.
    #[serde(default)]
    pub version_attribute: Option<String>,
}

/// Read a version out of a JSON or YAML file and emit its components.
pub fn extract(ctx: &mut Context<'_>, args: ExtractArgs) -> Result<()> {
    let Some(file) = non_empty(args.version_file) else {
        info!("No file name provided, skipping extraction.");
        return Ok(());
    };
    let attribute = non_empty(args.version_attribute)
        .unwrap_or_else(|| DEFAULT_VERSION_ATTRIBUTE.to_owned());
    tracing::debug!("extracting {attribute} from {file}");

    let Some(raw) = read_version_attribute(Path::new(&file), &attribute)? else {
        bail!("Version attribute \"{attribute}\" not found in file: {file}");
    };
    ctx.outputs.set("rawVersion", raw.as_str())?;
    let Some(version) = parse_version(&raw) else {
        bail!("Invalid version format: {raw}");
    };
    info!("Parsed version: {version:?}");

    let outputs = &mut *ctx.outputs;
    outputs.set("major", version.major.to_string())?;
    outputs.set("minor", version.minor.to_string())?;
    outputs.set("patch", version.patch.to_string())?;
    outputs.set("pre", version.pre.join("."))?;
    outputs.set("build", version.build.clone().unwrap_or_default())?;
    outputs.set("majorMinor", format!("{}.{}", version.major, version.minor))?;
    outputs.set(
        "majorMinorPatch",
        format!("{}.{}.{}", version.major, version.minor, version.patch),
    )?;
    outputs.set("majorMinorPatchPre", version.core_with_pre())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArgs {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub version_file: Option<String>,
    #[serde(default)]
    pub version_attribute: Option<String>,
}

/// Write a version back into a JSON or YAML file.
pub fn update(_ctx: &mut Context<'_>, args: UpdateArgs) -> Result<()> {
    let Some(file) = non_empty(args.version_file) else {
        info!("No file name provided, skipping version update.");
        return Ok(());
    };
    let Some(version) = non_empty(args.version) else {
        info!("No version provided, skipping update.");
        return Ok(());
    };
    let attribute = non_empty(args.version_attribute)
        .unwrap_or_else(|| DEFAULT_VERSION_ATTRIBUTE.to_owned());

    write_version_attribute(Path::new(&file), &attribute, &version)?;
    info!("Updated version in {file}, {attribute}: {version}");
    Ok(())
}
