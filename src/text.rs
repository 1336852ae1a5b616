use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

/// Canonical form used to compare human-entered status names across locales.
///
/// Lowercases first (Unicode case folding, locale-invariant), then
/// transliterates to ASCII. Transliteration tables may yield capitalised
/// syllables (CJK, for instance), so their output is folded to ASCII
/// lowercase to keep the canonical form a fixed point.
pub fn normalize(input: &str) -> String {
    transliterate(&lowercase(input))
}

fn lowercase(input: &str) -> String {
    input.to_lowercase()
}

fn transliterate(input: &str) -> String {
    deunicode::deunicode_with_tofu(input, "").to_ascii_lowercase()
}

/// Extract every distinct match of `pattern` from `text`, in first-seen order.
pub fn infer_issues(text: &str, pattern: &str) -> Result<Vec<String>> {
    let re = Regex::new(pattern).with_context(|| format!("invalid issue pattern {pattern:?}"))?;
    let mut seen = HashSet::new();
    Ok(re
        .find_iter(text)
        .map(|m| m.as_str().to_owned())
        .filter(|key| seen.insert(key.clone()))
        .collect())
}

/// Replace control characters (line breaks, tabs, escapes) with
/// `replacement`. Everything printable, including non-ASCII, is kept.
pub fn sanitize_non_printable(text: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            out.push_str(replacement);
        } else {
            out.push(c);
        }
    }
    out
}
