use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::models::MatchResult;
use crate::utils::{sorted_match_strings, write_json_pretty};

/// The set of matches seen at the end of the previous run, kept as a JSON array of match strings.
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BaselineStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty baseline. A file that exists but does not
    /// parse is an error.
    pub fn load(&self) -> Result<HashSet<MatchResult>> {
        if !self.path.exists() {
            debug!("No baseline at {}, starting empty", self.path.display());
            return Ok(HashSet::new());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let strings: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed baseline file {}", self.path.display()))?;

        strings
            .iter()
            .map(|s| {
                s.parse::<MatchResult>()
                    .with_context(|| format!("Malformed entry in {}", self.path.display()))
            })
            .collect()
    }

    /// Replaces the file with `matches`, sorted by match string.
    pub fn save(&self, matches: &HashSet<MatchResult>) -> Result<()> {
        let strings = sorted_match_strings(matches.iter());
        write_json_pretty(&self.path, &strings)?;
        debug!("Saved {} matches to {}", strings.len(), self.path.display());
        Ok(())
    }
}
