use anyhow::{Context, Result, anyhow, ensure};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fetch::DateRange;

/// Pipeline settings, stored as a JSON file:
///
/// ```json
/// {
///   "api": { "base_url": "https://data.cityofnewyork.us/resource/4b4i-vvec.json", "limit": 50000 },
///   "date_ranges": {
///     "initial": { "start": "2023-01-01", "end": "2023-01-31" }
///   },
///   "storage": { "dataset_path": "./data/taxi_trips.parquet" }
/// }
/// ```
///
/// `BASE_URL`, `LIMIT` and `APP_TOKEN` in the environment take precedence
/// over the file.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub date_ranges: HashMap<String, DateRange>,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Records requested per page.
    pub limit: usize,
    #[serde(default)]
    pub app_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("./data/taxi_trips.parquet")
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path` and applies environment
    /// overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a config without consulting the environment.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces settings with values returned by `lookup` for `BASE_URL`,
    /// `LIMIT` and `APP_TOKEN`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(base_url) = lookup("BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Some(limit) = lookup("LIMIT") {
            self.api.limit = limit
                .trim()
                .parse()
                .with_context(|| format!("LIMIT must be a positive integer, got `{limit}`"))?;
        }
        if let Some(token) = lookup("APP_TOKEN").filter(|t| !t.is_empty()) {
            self.api.app_token = Some(token);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url)
            .with_context(|| format!("invalid base_url `{}`", self.api.base_url))?;
        ensure!(self.api.limit > 0, "limit must be greater than zero");
        for (name, range) in &self.date_ranges {
            range
                .validate()
                .with_context(|| format!("invalid date range `{name}`"))?;
        }
        Ok(())
    }

    /// Returns the named date range.
    pub fn range(&self, name: &str) -> Result<DateRange> {
        self.date_ranges.get(name).copied().ok_or_else(|| {
            let mut known: Vec<&str> = self.date_ranges.keys().map(String::as_str).collect();
            known.sort_unstable();
            anyhow!("unknown date range `{name}` (configured: {})", known.join(", "))
        })
    }
}
