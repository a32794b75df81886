use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_yaml::Deserializer;
use url::Url;

use crate::teams::TeamRegistry;

const APP_PREFIX: &str = "matchmind";
const CONFIG_FILE: &str = "config.yaml";

const DATA_DIR: &str = "data";
pub const BASELINE_FILE: &str = "previous_matches.json";
pub const BACKUP_FILE: &str = "summarized_football_data.json";

const DEFAULT_API_BASE_URL: &str = "https://www.thesportsdb.com/api/v1/json/3/";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_SUMMARY_MAX_LENGTH: u32 = 50;
const DEFAULT_SUMMARY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LEAGUE: &str = "Greek Super League";
const DEFAULT_SEASON: &str = "2024-2025";
const DEFAULT_DB_NAME: &str = "football_analysis";
const DEFAULT_DB_COLLECTION: &str = "greek_matches";

/// What the YAML file may contain. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub teams: Option<Vec<String>>,
    pub api_base_url: Option<String>,
    pub fetch_timeout_secs: Option<u64>,
    pub data_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub summary_max_length: Option<u32>,
    pub summary_timeout_secs: Option<u64>,
    pub league: Option<String>,
    pub season: Option<String>,
    pub db_uri: Option<PathBuf>,
    pub db_name: Option<String>,
    pub db_collection: Option<String>,
}

/// Where the document collection lives: `<uri>/<database>.sqlite3`, table `<collection>`.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub uri: PathBuf,
    pub database: String,
    pub collection: String,
}

impl StoreConfig {
    pub fn database_path(&self) -> PathBuf {
        self.uri.join(format!("{}.sqlite3", self.database))
    }
}

/// Resolved runtime configuration, built once at startup and handed to every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub teams: TeamRegistry,
    pub api_base_url: Url,
    pub fetch_timeout: Duration,
    pub data_dir: PathBuf,
    pub api_key: Option<String>,
    /// OpenAI-compatible endpoint; `None` means the client default.
    pub api_base: Option<String>,
    pub model: String,
    pub summary_max_length: u32,
    pub summary_timeout: Duration,
    pub league: String,
    pub season: String,
    pub store: StoreConfig,
}

pub struct EnsureOutcome {
    pub path: PathBuf,
    pub created: bool,
}

impl Config {
    pub fn baseline_path(&self) -> PathBuf {
        self.data_dir.join(BASELINE_FILE)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.data_dir.join(BACKUP_FILE)
    }

    /// Defaults only, rooted at `data_dir`. Environment is ignored.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Config> {
        let file = FileConfig {
            data_dir: Some(data_dir.into()),
            ..FileConfig::default()
        };
        Config::resolve(file, |_| None)
    }

    /// Merge file values, environment overrides and defaults.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let teams = match file.teams {
            Some(names) if !names.is_empty() => TeamRegistry::new(names),
            Some(_) => return Err(anyhow!("`teams` must list at least one team")),
            None => TeamRegistry::default(),
        };

        let mut base = file
            .api_base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_base_url =
            Url::parse(&base).with_context(|| format!("Invalid api_base_url {:?}", base))?;

        let data_dir = match env("MATCHMIND_DATA_DIR").map(PathBuf::from).or(file.data_dir) {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        let store = StoreConfig {
            uri: env("MATCHMIND_DB_URI")
                .map(PathBuf::from)
                .or(file.db_uri)
                .unwrap_or_else(|| data_dir.clone()),
            database: env("MATCHMIND_DB_NAME")
                .or(file.db_name)
                .unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            collection: env("MATCHMIND_DB_COLLECTION")
                .or(file.db_collection)
                .unwrap_or_else(|| DEFAULT_DB_COLLECTION.to_string()),
        };

        Ok(Config {
            teams,
            api_base_url,
            fetch_timeout: Duration::from_secs(
                file.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
            data_dir,
            api_key: env("OPENAI_API_KEY").or(file.api_key),
            api_base: env("OPENAI_BASE_URL").or(file.api_base),
            model: file.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            summary_max_length: file.summary_max_length.unwrap_or(DEFAULT_SUMMARY_MAX_LENGTH),
            summary_timeout: Duration::from_secs(
                file.summary_timeout_secs.unwrap_or(DEFAULT_SUMMARY_TIMEOUT_SECS),
            ),
            league: file.league.unwrap_or_else(|| DEFAULT_LEAGUE.to_string()),
            season: file.season.unwrap_or_else(|| DEFAULT_SEASON.to_string()),
            store,
        })
    }

    pub fn ensure_user_config() -> Result<EnsureOutcome> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX);

        if let Some(path) = xdg_dirs.find_config_file(CONFIG_FILE) {
            return Ok(EnsureOutcome {
                path,
                created: false,
            });
        }

        let config_path = xdg_dirs
            .place_config_file(CONFIG_FILE)
            .context("Cannot create configuration directory")?;
        let mut config_file = File::create(&config_path)?;

        write!(
            &mut config_file,
            r#"# matchmind config (YAML)
# Every key is optional; the commented values are the defaults.

# teams:
#   - "Olympiacos"
#   - "PAOK"
# api_base_url: "{DEFAULT_API_BASE_URL}"
# fetch_timeout_secs: {DEFAULT_FETCH_TIMEOUT_SECS}
# data_dir: "/path/to/data"          # MATCHMIND_DATA_DIR, defaults to `data/` next to the executable

# Summaries (OPENAI_API_KEY overrides api_key). Without a key, template summaries are used.
# api_key: "<your OpenAI API key>"
# api_base: "https://api.openai.com/v1"   # OPENAI_BASE_URL
# model: "{DEFAULT_MODEL}"
# summary_max_length: {DEFAULT_SUMMARY_MAX_LENGTH}
# summary_timeout_secs: {DEFAULT_SUMMARY_TIMEOUT_SECS}

# league: "{DEFAULT_LEAGUE}"
# season: "{DEFAULT_SEASON}"

# Document store (env: MATCHMIND_DB_URI, MATCHMIND_DB_NAME, MATCHMIND_DB_COLLECTION)
# db_uri: "/path/to/db/dir"          # defaults to data_dir
# db_name: "{DEFAULT_DB_NAME}"
# db_collection: "{DEFAULT_DB_COLLECTION}"
"#
        )?;

        Ok(EnsureOutcome {
            path: config_path,
            created: true,
        })
    }

    pub fn load(path: &Path) -> Result<Config> {
        let file = read_file_config(path)?;
        Config::resolve(file, |key| std::env::var(key).ok())
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    // A file holding nothing but comments deserializes as null.
    if raw.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
        return Ok(FileConfig::default());
    }

    let deserialized = Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(deserialized).map_err(|e| {
        anyhow!(
            "Invalid YAML in {} at `{}`: {}",
            path.display(),
            e.path(),
            e.inner()
        )
    })
}

/// `data/` beside the running executable.
fn default_data_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot locate the running executable")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow!("Executable {} has no parent directory", exe.display()))?;
    Ok(dir.join(DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = Config::with_data_dir("/tmp/mm").unwrap();
        assert_eq!(cfg.teams.len(), 13);
        assert_eq!(cfg.baseline_path(), PathBuf::from("/tmp/mm/previous_matches.json"));
        assert_eq!(cfg.backup_path(), PathBuf::from("/tmp/mm/summarized_football_data.json"));
        assert_eq!(
            cfg.store.database_path(),
            PathBuf::from("/tmp/mm/football_analysis.sqlite3")
        );
        assert_eq!(cfg.store.collection, "greek_matches");
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            data_dir: Some(PathBuf::from("/from/file")),
            db_name: Some("file_db".to_string()),
            api_key: Some("file-key".to_string()),
            ..FileConfig::default()
        };
        let env: HashMap<&str, &str> = HashMap::from([
            ("MATCHMIND_DB_NAME", "env_db"),
            ("MATCHMIND_DB_COLLECTION", "env_collection"),
            ("OPENAI_API_KEY", ""),
        ]);

        let cfg = Config::resolve(file, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/from/file"));
        assert_eq!(cfg.store.database, "env_db");
        assert_eq!(cfg.store.collection, "env_collection");
        // blank env values do not override
        assert_eq!(cfg.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn test_data_dir_defaults_next_to_executable() {
        let cfg = Config::resolve(FileConfig::default(), |_| None).unwrap();
        let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();

        assert_eq!(cfg.data_dir, exe_dir.join("data"));
        assert_eq!(cfg.baseline_path(), exe_dir.join("data").join(BASELINE_FILE));
        assert_eq!(cfg.store.uri, exe_dir.join("data"));
    }

    #[test]
    fn test_data_dir_env_beats_file_and_default() {
        let file = FileConfig {
            data_dir: Some(PathBuf::from("/from/file")),
            ..FileConfig::default()
        };
        let cfg = Config::resolve(file, |k| {
            (k == "MATCHMIND_DATA_DIR").then(|| "/from/env".to_string())
        })
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let file = FileConfig {
            api_base_url: Some("http://127.0.0.1:9999/api".to_string()),
            data_dir: Some(PathBuf::from("/tmp")),
            ..FileConfig::default()
        };
        let cfg = Config::resolve(file, |_| None).unwrap();
        assert_eq!(cfg.api_base_url.as_str(), "http://127.0.0.1:9999/api/");
    }

    #[test]
    fn test_empty_team_list_is_rejected() {
        let file = FileConfig {
            teams: Some(vec![]),
            ..FileConfig::default()
        };
        assert!(Config::resolve(file, |_| None).is_err());
    }

    #[test]
    fn test_yaml_errors_name_the_key() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "fetch_timeout_secs: soon\n").unwrap();

        let err = read_file_config(&path).unwrap_err().to_string();
        assert!(err.contains("fetch_timeout_secs"), "unexpected error: {err}");
    }

    #[test]
    fn test_comment_only_file_is_empty_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "# nothing here\n\n# model: x\n").unwrap();

        let file = read_file_config(&path).unwrap();
        assert!(file.model.is_none());
    }
}
