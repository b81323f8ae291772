//! Run configuration: one TOML file covering every stage, validated
//! before any network or database handle is opened.
//!
//! Engine knobs are re-packed into [`ReconcileConfig`] so the engine
//! crate stays ignorant of transport and database settings.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use capitol_adapters::{FetchOptions, RetryPolicy};
use capitol_model::{Party, Source};
use capitol_recon::ReconcileConfig;
use serde::Deserialize;

use crate::CliError;

fn default_congress() -> u16 {
    119
}

fn default_fetch_concurrency() -> usize {
    3
}

fn default_per_source_timeout_s() -> u64 {
    30
}

fn default_retry_budget() -> u32 {
    5
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_congress")]
    pub congress_number: u16,

    pub majority_party_house: Party,
    pub majority_party_senate: Party,

    /// Attribute-keyed overrides of the default source orders.
    #[serde(default)]
    pub source_priorities: BTreeMap<String, Vec<Source>>,

    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    #[serde(default = "default_per_source_timeout_s")]
    pub per_source_timeout_s: u64,

    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,

    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Overridden by `DATABASE_URL` when set.
    #[serde(default)]
    pub database_dsn: Option<String>,

    #[serde(default)]
    pub dry_run: bool,
}

impl RunConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::usage(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, CliError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| CliError::config(format!("config parse error: {e}")))?;
        // Engine-side validation covers the attribute keys and order
        // shapes; run it now so a bad config fails before fetch.
        config.engine().validate().map_err(|e| CliError::config(e.to_string()))?;
        if config.fetch_concurrency == 0 {
            return Err(CliError::config("fetch_concurrency must be positive"));
        }
        if config.retry_budget == 0 {
            return Err(CliError::config("retry_budget must be positive"));
        }
        Ok(config)
    }

    pub fn engine(&self) -> ReconcileConfig {
        ReconcileConfig {
            congress_number: self.congress_number,
            majority_party_house: self.majority_party_house,
            majority_party_senate: self.majority_party_senate,
            source_priorities: self.source_priorities.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            budget: self.retry_budget,
            timeout: Duration::from_secs(self.per_source_timeout_s),
            ..RetryPolicy::default()
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions { congress: self.congress_number, concurrency: self.fetch_concurrency }
    }

    /// `DATABASE_URL` wins over the config file so deploy environments
    /// can inject credentials without editing the TOML.
    pub fn dsn(&self) -> Result<String, CliError> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
        self.database_dsn.clone().ok_or_else(|| {
            CliError::usage("no database DSN configured")
                .with_hint("set database_dsn in the config or the DATABASE_URL environment variable")
        })
    }
}
