use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{MatchReport, MatchResult};

/// Match strings in lexicographic order, the order every file and console listing uses.
pub fn sorted_match_strings<'a, I>(matches: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a MatchResult>,
{
    let mut strings: Vec<String> = matches.into_iter().map(|m| m.to_string()).collect();
    strings.sort();
    strings
}

/// Pretty JSON, UTF-8 as-is, full overwrite. Creates the parent directory if needed.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn format_new_matches_plain_text(reports: &[MatchReport]) -> String {
    let mut output = String::new();

    for report in reports {
        output.push_str(&format!("  ⚽ {}\n", report.match_string));
        output.push_str(&format!("     {}\n", report.summary));
    }

    output.trim_end().to_string()
}
