use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

// The score token is the anchor, so team names may contain spaces on both sides.
static MATCH_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<home>.+?)\s+(?P<hs>\d+)-(?P<as>\d+)\s+(?P<away>.+)$")
        .expect("match string pattern is valid")
});

/// A finished fixture between two registry teams.
///
/// Equality and hashing cover all four fields, which makes the record its own
/// deduplication key. `Display` renders the canonical match string
/// `"<home> <homeScore>-<awayScore> <away>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchResult {
    pub home: String,
    pub away: String,
    pub home_score: u32,
    pub away_score: u32,
}

impl MatchResult {
    pub fn new(home: impl Into<String>, home_score: u32, away_score: u32, away: impl Into<String>) -> Self {
        MatchResult {
            home: home.into(),
            away: away.into(),
            home_score,
            away_score,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Less => Outcome::AwayWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    pub fn score(&self) -> String {
        format!("{}-{}", self.home_score, self.away_score)
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.home, self.score(), self.away)
    }
}

impl FromStr for MatchResult {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = MATCH_STRING
            .captures(s.trim())
            .ok_or_else(|| anyhow!("Not a match string: {:?}", s))?;

        let home_score = caps["hs"]
            .parse::<u32>()
            .with_context(|| format!("Invalid home score in {:?}", s))?;
        let away_score = caps["as"]
            .parse::<u32>()
            .with_context(|| format!("Invalid away score in {:?}", s))?;

        Ok(MatchResult {
            home: caps["home"].trim().to_string(),
            away: caps["away"].trim().to_string(),
            home_score,
            away_score,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::HomeWin => "home win",
            Outcome::AwayWin => "away win",
            Outcome::Draw => "draw",
        };
        f.write_str(label)
    }
}

/// One document per newly detected match, written to the backup file and the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub match_id: usize,
    #[serde(rename = "match")]
    pub match_string: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub outcome: Outcome,
    pub league: String,
    pub season: String,
    pub report: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}
