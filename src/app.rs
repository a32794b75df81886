use std::path::PathBuf;

use anyhow::Result;
use log::{debug, error, info, warn};

use crate::ai_summarizer::{Backend, Summarizer};
use crate::baseline::BaselineStore;
use crate::config::{Config, EnsureOutcome};
use crate::db::{Db, DocumentStore};
use crate::diff::new_matches;
use crate::fetcher::MatchFetcher;
use crate::logger::init_logger;
use crate::models::MatchReport;
use crate::report::ReportGenerator;
use crate::sink::{persist_reports, SinkOutcome};
use crate::utils::format_new_matches_plain_text;

pub struct RunOptions {
    pub no_ai: bool,
    pub no_db: bool,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub previous: usize,
    pub fetched: usize,
    pub failed_teams: Vec<String>,
    pub reports: Vec<MatchReport>,
    pub sink: Option<SinkOutcome>,
    pub baseline_saved: bool,
}

pub async fn run(opts: RunOptions) -> Result<()> {
    // 0) Initialize logger
    init_logger()?;

    // 1) Resolve config
    let config_path = match opts.config_path {
        Some(path) => path,
        None => {
            let outcome: EnsureOutcome = Config::ensure_user_config()?;
            if outcome.created {
                info!("Config template created at {}", outcome.path.display());
                println!("📝 Config template written to {} (defaults in use)", outcome.path.display());
            }
            outcome.path
        }
    };
    let cfg = Config::load(&config_path)?;
    debug!("Config loaded from {}", config_path.display());

    // 2) Collaborators
    let summarizer = Backend::from_config(&cfg, opts.no_ai);
    if !summarizer.is_enabled() {
        info!("Summarization model disabled, template summaries will be used");
    }
    let fetcher = MatchFetcher::new(&cfg)?;

    let no_db = opts.no_db;
    let store = &cfg.store;
    run_once(&cfg, &fetcher, &summarizer, || {
        if no_db {
            None
        } else {
            Some(Db::open(store))
        }
    })
    .await?;

    Ok(())
}

/// One pass of fetch, diff, report, persist. Only a malformed baseline aborts it.
pub async fn run_once<S, D, F>(
    cfg: &Config,
    fetcher: &MatchFetcher<'_>,
    summarizer: &S,
    open_store: F,
) -> Result<RunSummary>
where
    S: Summarizer,
    D: DocumentStore,
    F: FnOnce() -> Option<Result<D>>,
{
    println!("⚽ {} - NEW MATCHES", cfg.league.to_uppercase());
    println!("{}", "=".repeat(45));

    let baseline = BaselineStore::new(cfg.baseline_path());
    let previous = baseline.load()?;
    println!("📁 Previously stored matches: {}", previous.len());

    let fetched = fetcher.fetch_all().await;
    println!("🔍 Current matches from API: {}", fetched.matches.len());
    if !fetched.failed_teams.is_empty() {
        println!(
            "⚠️  Fetch failed for {} team(s): {}",
            fetched.failed_teams.len(),
            fetched.failed_teams.join(", ")
        );
    }

    let fresh = new_matches(&fetched.matches, &previous);
    let mut summary = RunSummary {
        previous: previous.len(),
        fetched: fetched.matches.len(),
        failed_teams: fetched.failed_teams.clone(),
        ..RunSummary::default()
    };

    if fresh.is_empty() {
        println!("\n✅ No new matches since last check");
    } else {
        println!("\n🎯 NEW MATCHES FOUND: {}", fresh.len());

        let generator =
            ReportGenerator::new(summarizer, &cfg.league, &cfg.season, cfg.summary_max_length);
        let reports = generator.generate(&fresh).await;
        println!("{}", format_new_matches_plain_text(&reports));

        let sink = persist_reports(&cfg.backup_path(), &reports, open_store());
        if sink.backup_written {
            println!("\n📁 Backup saved to {}", cfg.backup_path().display());
        }
        match sink.stored {
            Some(n) => println!("✅ Saved {} matches to the document store", n),
            None => println!("⚠️  Matches were not saved to the document store"),
        }

        summary.reports = reports;
        summary.sink = Some(sink);
    }

    match baseline.save(&fetched.matches) {
        Ok(()) => {
            summary.baseline_saved = true;
            println!("\n💾 Saved {} matches for next comparison", fetched.matches.len());
        }
        Err(e) => {
            error!("Could not save baseline {}: {:#}", baseline.path().display(), e);
            warn!("Next run will compare against the previous baseline");
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchResult;
    use crate::report::tests::{EchoSummarizer, FailingSummarizer};
    use crate::sink::tests::{BrokenStore, MemoryStore};
    use crate::teams::TeamRegistry;
    use serde_json::json;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_team(server: &MockServer, team: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/searchevents.php"))
            .and(query_param("e", team))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn setup(tmp: &TempDir) -> (MockServer, Config) {
        let server = MockServer::start().await;
        mock_team(&server, "Olympiacos", json!({"event": [
            {"strHomeTeam": "Olympiacos", "strAwayTeam": "PAOK", "intHomeScore": "2", "intAwayScore": "1"},
            {"strHomeTeam": "Olympiacos", "strAwayTeam": "Barcelona", "intHomeScore": "1", "intAwayScore": "0"},
            {"strHomeTeam": "Aris", "strAwayTeam": "Olympiacos", "intHomeScore": null, "intAwayScore": null}
        ]}))
        .await;
        mock_team(&server, "PAOK", json!({"event": [
            {"strHomeTeam": "Olympiacos", "strAwayTeam": "PAOK", "intHomeScore": "2", "intAwayScore": "1"},
            {"strHomeTeam": "PAOK", "strAwayTeam": "AEK Athens", "intHomeScore": 0, "intAwayScore": 0}
        ]}))
        .await;
        mock_team(&server, "AEK Athens", json!({"event": null})).await;
        Mock::given(method("GET"))
            .and(path("/searchevents.php"))
            .and(query_param("e", "Aris"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut cfg = Config::with_data_dir(tmp.path().join("data")).unwrap();
        cfg.api_base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
        cfg.teams = TeamRegistry::new(["Olympiacos", "PAOK", "Aris", "AEK Athens"]);
        (server, cfg)
    }

    fn baseline_strings(cfg: &Config) -> Vec<String> {
        serde_json::from_str(&fs::read_to_string(cfg.baseline_path()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_first_run_reports_everything_then_nothing() {
        let tmp = TempDir::new().unwrap();
        let (_server, cfg) = setup(&tmp).await;
        let fetcher = MatchFetcher::new(&cfg).unwrap();
        let mut memory = MemoryStore::default();

        let first = run_once(&cfg, &fetcher, &EchoSummarizer, || Some(Ok(&mut memory)))
            .await
            .unwrap();

        assert_eq!(first.previous, 0);
        assert_eq!(first.fetched, 2);
        assert_eq!(first.failed_teams, vec!["Aris".to_string()]);
        let new: Vec<&str> = first.reports.iter().map(|r| r.match_string.as_str()).collect();
        assert_eq!(new, vec!["Olympiacos 2-1 PAOK", "PAOK 0-0 AEK Athens"]);
        assert_eq!(memory.documents.len(), 2);
        assert!(first.baseline_saved);
        assert_eq!(baseline_strings(&cfg), vec!["Olympiacos 2-1 PAOK", "PAOK 0-0 AEK Athens"]);

        let second = run_once(&cfg, &fetcher, &EchoSummarizer, || Some(Ok(&mut memory)))
            .await
            .unwrap();
        assert_eq!(second.previous, 2);
        assert!(second.reports.is_empty());
        assert!(second.sink.is_none());
        assert_eq!(memory.documents.len(), 2);
    }

    #[tokio::test]
    async fn test_store_and_model_failures_degrade() {
        let tmp = TempDir::new().unwrap();
        let (_server, cfg) = setup(&tmp).await;
        let fetcher = MatchFetcher::new(&cfg).unwrap();

        // seed a baseline holding one of the two matches plus a stale one
        let seeded: HashSet<MatchResult> = [
            MatchResult::new("Olympiacos", 2, 1, "PAOK"),
            MatchResult::new("Aris", 3, 3, "AEK Athens"),
        ]
        .into_iter()
        .collect();
        BaselineStore::new(cfg.baseline_path()).save(&seeded).unwrap();

        let summary = run_once(&cfg, &fetcher, &FailingSummarizer, || Some(Ok(BrokenStore)))
            .await
            .unwrap();

        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].summary, "Match: PAOK 0-0 AEK Athens");
        let sink = summary.sink.unwrap();
        assert!(sink.backup_written);
        assert_eq!(sink.stored, None);

        let backup: Vec<MatchReport> =
            serde_json::from_str(&fs::read_to_string(cfg.backup_path()).unwrap()).unwrap();
        assert_eq!(backup, summary.reports);

        // baseline is replaced by the fetched set, the stale entry is gone
        assert_eq!(baseline_strings(&cfg), vec!["Olympiacos 2-1 PAOK", "PAOK 0-0 AEK Athens"]);
    }

    #[tokio::test]
    async fn test_store_disabled() {
        let tmp = TempDir::new().unwrap();
        let (_server, cfg) = setup(&tmp).await;
        let fetcher = MatchFetcher::new(&cfg).unwrap();

        let summary = run_once::<_, BrokenStore, _>(&cfg, &fetcher, &FailingSummarizer, || None)
            .await
            .unwrap();

        let sink = summary.sink.unwrap();
        assert!(sink.backup_written);
        assert_eq!(sink.stored, None);
        assert!(summary.baseline_saved);
    }

    #[tokio::test]
    async fn test_malformed_baseline_aborts() {
        let tmp = TempDir::new().unwrap();
        let (_server, cfg) = setup(&tmp).await;
        fs::create_dir_all(&cfg.data_dir).unwrap();
        fs::write(cfg.baseline_path(), "[\"Olympiacos 2-1 PAOK\",").unwrap();
        let fetcher = MatchFetcher::new(&cfg).unwrap();

        let result = run_once::<_, BrokenStore, _>(&cfg, &fetcher, &FailingSummarizer, || None).await;

        assert!(result.is_err());
        assert!(!cfg.backup_path().exists());
    }
}
