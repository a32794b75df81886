use std::collections::HashSet;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::models::MatchResult;
use crate::teams::TeamRegistry;

const SEARCH_ENDPOINT: &str = "searchevents.php";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    // TheSportsDB answers `{"event": null}` when nothing matches.
    #[serde(default)]
    event: Option<Vec<ApiEvent>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEvent {
    #[serde(rename = "strHomeTeam", default)]
    pub home_team: Option<String>,
    #[serde(rename = "strAwayTeam", default)]
    pub away_team: Option<String>,
    #[serde(rename = "intHomeScore", default, deserialize_with = "lenient_score")]
    pub home_score: Option<u32>,
    #[serde(rename = "intAwayScore", default, deserialize_with = "lenient_score")]
    pub away_score: Option<u32>,
}

/// Scores arrive as `"2"`, `2`, `""` or `null` depending on the endpoint.
/// Anything that is not a non-negative integer counts as absent.
fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

/// Keep finished fixtures between two registry teams.
pub fn filter_events<'a>(
    events: &'a [ApiEvent],
    registry: &'a TeamRegistry,
) -> impl Iterator<Item = MatchResult> + 'a {
    events.iter().filter_map(move |event| {
        let home_score = event.home_score?;
        let home = event.home_team.as_deref()?.trim();
        let away = event.away_team.as_deref()?.trim();

        if !registry.contains(home) || !registry.contains(away) {
            return None;
        }

        let Some(away_score) = event.away_score else {
            debug!("Skipping {} vs {}: home score without away score", home, away);
            return None;
        };

        Some(MatchResult::new(home, home_score, away_score, away))
    })
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub matches: HashSet<MatchResult>,
    pub failed_teams: Vec<String>,
}

pub struct MatchFetcher<'a> {
    client: Client,
    base_url: &'a Url,
    registry: &'a TeamRegistry,
}

impl<'a> MatchFetcher<'a> {
    pub fn new(cfg: &'a Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.fetch_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(MatchFetcher {
            client,
            base_url: &cfg.api_base_url,
            registry: &cfg.teams,
        })
    }

    fn search_url(&self, team: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(SEARCH_ENDPOINT)
            .with_context(|| format!("Cannot build search URL from {}", self.base_url))?;
        url.query_pairs_mut().append_pair("e", team);
        Ok(url)
    }

    pub async fn fetch_team(&self, team: &str) -> Result<Vec<ApiEvent>> {
        let url = self.search_url(team)?;
        debug!("GET {}", url);

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let parsed: SearchResponse =
            serde_json::from_str(&body).context("Malformed search response")?;
        Ok(parsed.event.unwrap_or_default())
    }

    /// One request per team, in registry order. A failing team is skipped.
    pub async fn fetch_all(&self) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        info!("Querying {} teams", self.registry.len());

        for team in self.registry.iter() {
            match self.fetch_team(team).await {
                Ok(events) => {
                    let before = outcome.matches.len();
                    outcome.matches.extend(filter_events(&events, self.registry));
                    debug!(
                        "{}: {} events, {} new finished league matches",
                        team,
                        events.len(),
                        outcome.matches.len() - before
                    );
                }
                Err(e) => {
                    warn!("Failed to fetch for {}: {:#}", team, e);
                    outcome.failed_teams.push(team.to_string());
                }
            }
        }

        info!(
            "Fetched {} matches, {} teams failed",
            outcome.matches.len(),
            outcome.failed_teams.len()
        );
        outcome
    }
}
