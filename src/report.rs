use chrono::Utc;
use log::{debug, warn};

use crate::ai_summarizer::Summarizer;
use crate::models::{MatchReport, MatchResult, Outcome};

/// Fixed-template paragraph describing a result. This is what gets condensed.
pub fn build_report(m: &MatchResult, league: &str) -> String {
    let verdict = match m.outcome() {
        Outcome::HomeWin => format!("{} won at home", m.home),
        Outcome::AwayWin => format!("{} won away", m.away),
        Outcome::Draw => "The match ended in a draw".to_string(),
    };

    format!(
        "{league} match between {home} and {away}. \
         The final score was {hs} to {as_} ({outcome}). \
         {verdict}. Both teams displayed competitive performance throughout the game. \
         This result impacts their standings in the league table.",
        home = m.home,
        away = m.away,
        hs = m.home_score,
        as_ = m.away_score,
        outcome = m.outcome(),
    )
}

/// One-liner used whenever the model cannot be used.
pub fn fallback_summary(m: &MatchResult) -> String {
    format!("Match: {} {}-{} {}", m.home, m.home_score, m.away_score, m.away)
}

/// Returns `(report, summary)`. Never fails: a summarizer error yields the template summary.
pub async fn create_report<S: Summarizer>(
    m: &MatchResult,
    league: &str,
    summarizer: &S,
    max_length: u32,
) -> (String, String) {
    let report = build_report(m, league);

    let summary = match summarizer.summarize(&report, max_length).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!("Empty summary for {}, using template", m);
            fallback_summary(m)
        }
        Err(e) => {
            debug!("Summarizer failed for {}: {:?}", m, e);
            fallback_summary(m)
        }
    };

    (report, summary)
}

pub struct ReportGenerator<'a, S> {
    summarizer: &'a S,
    league: &'a str,
    season: &'a str,
    max_length: u32,
}

impl<'a, S: Summarizer> ReportGenerator<'a, S> {
    pub fn new(summarizer: &'a S, league: &'a str, season: &'a str, max_length: u32) -> Self {
        ReportGenerator {
            summarizer,
            league,
            season,
            max_length,
        }
    }

    /// Builds the documents for a run, numbering them from 1 in the order given.
    pub async fn generate(&self, matches: &[MatchResult]) -> Vec<MatchReport> {
        let mut reports = Vec::with_capacity(matches.len());

        for (i, m) in matches.iter().enumerate() {
            let (report, summary) =
                create_report(m, self.league, self.summarizer, self.max_length).await;

            reports.push(MatchReport {
                match_id: i + 1,
                match_string: m.to_string(),
                home_team: m.home.clone(),
                away_team: m.away.clone(),
                home_score: m.home_score,
                away_score: m.away_score,
                outcome: m.outcome(),
                league: self.league.to_string(),
                season: self.season.to_string(),
                report,
                summary,
                created_at: Utc::now(),
            });
        }

        reports
    }
}
