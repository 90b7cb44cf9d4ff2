//! Application configuration loaded from CLI, environment, and files.
//!
//! Values merge with ortho-config's layered precedence (lowest to highest):
//!
//! 1. **Defaults** – built-in application defaults
//! 2. **Configuration file** – `.magpie.toml` in the current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `MAGPIE_*`, with legacy `GITHUB_TOKEN` and
//!    `OPENAI_API_KEY` fallbacks
//! 4. **Command-line arguments**
//!
//! # Configuration File
//!
//! ```toml
//! stage = "scrape"
//! owner = "home-assistant"
//! repo = "core"
//! tokens = "ghp_one,ghp_two"
//! dataset_path = "data/pull_requests.csv"
//! filtered_dataset_path = "data/pull_requests_filtered.csv"
//! since = "2023-01-01"
//! until = "2023-06-30"
//! ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::classify::{ClassificationMode, OpenAiClassifierConfig};
use crate::github::{ScrapeError, TokenPool};

const DEFAULT_DATASET_PATH: &str = "data/pull_requests.csv";
const DEFAULT_FILTERED_DATASET_PATH: &str = "data/pull_requests_filtered.csv";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MIN_DECISION_DAYS: i64 = 7;

/// Which pipeline stage a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Collect pull request metadata into the dataset.
    #[default]
    Scrape,
    /// Fetch comments and render transcripts for scraped rows.
    Comments,
    /// Classify challenges from rendered transcripts.
    Categorize,
    /// Write the filtered subset used for analysis.
    Filter,
}

impl Stage {
    /// Short name used in logs and the CLI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Comments => "comments",
            Self::Categorize => "categorize",
            Self::Filter => "filter",
        }
    }
}

impl FromStr for Stage {
    type Err = ScrapeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scrape" => Ok(Self::Scrape),
            "comments" => Ok(Self::Comments),
            "categorize" | "categorise" => Ok(Self::Categorize),
            "filter" => Ok(Self::Filter),
            other => Err(ScrapeError::Configuration {
                message: format!(
                    "unknown stage '{other}' (expected scrape, comments, categorize, or filter)"
                ),
            }),
        }
    }
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use magpie::MagpieConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = MagpieConfig::load().expect("failed to load configuration");
/// let tokens = config.resolve_tokens().expect("token required");
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "MAGPIE",
    discovery(
        dotfile_name = ".magpie.toml",
        config_file_name = "magpie.toml",
        app_name = "magpie"
    )
)]
pub struct MagpieConfig {
    /// Pipeline stage to run: `scrape`, `comments`, `categorize`, or
    /// `filter`.
    #[ortho_config(cli_short = 's')]
    pub stage: Option<String>,

    /// Repository owner (e.g., "home-assistant").
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Repository name (e.g., "core").
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Comma-separated personal access tokens rotated through on rate
    /// limiting. Falls back to `GITHUB_TOKEN` when unset.
    #[ortho_config(cli_short = 't')]
    pub tokens: Option<String>,

    /// Path of the main dataset CSV.
    pub dataset_path: Option<String>,

    /// Path of the filtered dataset CSV produced by the filter stage.
    pub filtered_dataset_path: Option<String>,

    /// Inclusive start of the creation-date window (`YYYY-MM-DD`).
    pub since: Option<String>,

    /// Inclusive end of the creation-date window (`YYYY-MM-DD`).
    pub until: Option<String>,

    /// Maximum number of pull requests to process in this run.
    pub limit: Option<usize>,

    /// Base URL of the OpenAI-compatible API.
    pub ai_base_url: Option<String>,

    /// Model identifier for classification requests.
    pub ai_model: Option<String>,

    /// API key for the AI endpoint. Falls back to `OPENAI_API_KEY`.
    pub ai_api_key: Option<String>,

    /// Classification prompt variant: `discover` or `refine`.
    pub ai_mode: Option<String>,

    /// Minimum decision time in days for the filter stage.
    pub min_decision_days: Option<i64>,
}

impl MagpieConfig {
    /// Parses the configured stage, defaulting to `scrape`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Configuration`] for an unrecognised stage name.
    pub fn resolve_stage(&self) -> Result<Stage, ScrapeError> {
        self.stage
            .as_deref()
            .map_or(Ok(Stage::Scrape), Stage::from_str)
    }

    /// Builds the token pool from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MissingToken`] when no token source provides a
    /// value.
    pub fn resolve_tokens(&self) -> Result<TokenPool, ScrapeError> {
        let raw = self
            .tokens
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(ScrapeError::MissingToken)?;
        TokenPool::from_comma_separated(&raw)
    }

    /// Returns owner and repo if both are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Configuration`] when owner or repo is missing.
    pub fn require_repository_info(&self) -> Result<(&str, &str), ScrapeError> {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Ok((owner.as_str(), repo.as_str())),
            (None, _) => Err(ScrapeError::Configuration {
                message: "repository owner is required (use --owner or -o)".to_owned(),
            }),
            (_, None) => Err(ScrapeError::Configuration {
                message: "repository name is required (use --repo or -r)".to_owned(),
            }),
        }
    }

    /// Path of the main dataset CSV.
    #[must_use]
    pub fn dataset_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.dataset_path.as_deref().unwrap_or(DEFAULT_DATASET_PATH))
    }

    /// Path of the filtered dataset CSV.
    #[must_use]
    pub fn filtered_dataset_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(
            self.filtered_dataset_path
                .as_deref()
                .unwrap_or(DEFAULT_FILTERED_DATASET_PATH),
        )
    }

    /// Parses the creation-date window. Either bound may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Configuration`] for an unparseable date or a
    /// window whose start falls after its end.
    pub fn resolve_date_window(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ScrapeError> {
        let since = parse_date(self.since.as_deref(), "since")?;
        let until = parse_date(self.until.as_deref(), "until")?;
        if let (Some(start), Some(end)) = (since, until)
            && start > end
        {
            return Err(ScrapeError::Configuration {
                message: format!("since ({start}) must not be after until ({end})"),
            });
        }
        Ok((since, until))
    }

    /// Minimum decision time in days for the filter stage.
    #[must_use]
    pub fn min_decision_days(&self) -> i64 {
        self.min_decision_days.unwrap_or(DEFAULT_MIN_DECISION_DAYS)
    }

    /// Assembles classifier configuration, falling back to `OPENAI_API_KEY`
    /// for the key and to provider defaults for URL and model.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Configuration`] for an unrecognised AI mode.
    pub fn classifier_config(&self) -> Result<OpenAiClassifierConfig, ScrapeError> {
        let mode = match self.ai_mode.as_deref() {
            None => ClassificationMode::Discover,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "discover" => ClassificationMode::Discover,
                "refine" => ClassificationMode::Refine,
                other => {
                    return Err(ScrapeError::Configuration {
                        message: format!(
                            "unknown AI mode '{other}' (expected discover or refine)"
                        ),
                    });
                }
            },
        };

        let defaults = OpenAiClassifierConfig::default();
        Ok(OpenAiClassifierConfig {
            base_url: self
                .ai_base_url
                .clone()
                .unwrap_or(defaults.base_url),
            model: self.ai_model.clone().unwrap_or(defaults.model),
            api_key: self
                .ai_api_key
                .clone()
                .or_else(|| env::var("OPENAI_API_KEY").ok()),
            mode,
            timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
        })
    }
}

fn parse_date(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, ScrapeError> {
    raw.map(|value| {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|error| {
            ScrapeError::Configuration {
                message: format!("{field} must be a YYYY-MM-DD date: {error}"),
            }
        })
    })
    .transpose()
}
