//! Environment-driven configuration for data locations and the HTTP client.

use std::time::Duration;

use crate::error::{InsightsError, Result};

/// Public bucket that hosts the published dataset.
pub const DEFAULT_DATA_URL: &str =
    "https://storage.googleapis.com/covid19-open-data/covid19-vaccination-search-insights";
pub const DEFAULT_TOP_QUERIES_URL: &str =
    "https://storage.googleapis.com/covid19-open-data/covid19-vaccination-search-insights/top_queries/";
pub const DEFAULT_GEO_URL: &str =
    "https://storage.googleapis.com/covid19-open-data/covid19-vaccination-search-insights/staging/geo";
pub const DEFAULT_USER_AGENT: &str = "VaccinationSearchInsights/0.1 (data client)";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base location of `regions.csv`, the per-country files and the global file.
    pub data_url: String,
    /// Prefix the top-queries file names are appended to (no separator added).
    pub top_queries_url: String,
    /// Base location of `{geo_id}.geo.json` documents.
    pub geo_url: String,
    pub http_timeout: Duration,
    pub user_agent: String,
    /// Countries dropped from the global trends file.
    pub excluded_countries: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            top_queries_url: DEFAULT_TOP_QUERIES_URL.to_string(),
            geo_url: DEFAULT_GEO_URL.to_string(),
            http_timeout: Duration::from_secs(120),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            excluded_countries: vec!["Canada".to_string()],
        }
    }
}

impl Config {
    /// Build a config from `VSI_*` environment variables, falling back to defaults.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let http_timeout = match lookup("VSI_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| InsightsError::Config {
                    message: format!("VSI_HTTP_TIMEOUT_SECS must be a whole number, got {raw:?}"),
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.http_timeout,
        };

        let excluded_countries = match lookup("VSI_EXCLUDED_COUNTRIES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.excluded_countries,
        };

        Ok(Self {
            data_url: lookup("VSI_DATA_URL").unwrap_or(defaults.data_url),
            top_queries_url: lookup("VSI_TOP_QUERIES_URL").unwrap_or(defaults.top_queries_url),
            geo_url: lookup("VSI_GEO_URL").unwrap_or(defaults.geo_url),
            http_timeout,
            user_agent: lookup("VSI_USER_AGENT").unwrap_or(defaults.user_agent),
            excluded_countries,
        })
    }

    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = url.into();
        self
    }

    /// Location of a file under the data base URL.
    pub fn data_location(&self, file: &str) -> String {
        join(&self.data_url, file)
    }

    pub fn top_queries_location(&self, file: &str) -> String {
        format!("{}{}", self.top_queries_url, file)
    }

    pub fn geo_location(&self, geo_id: &str) -> String {
        join(&self.geo_url, &format!("{geo_id}.geo.json"))
    }
}

fn join(base: &str, file: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file)
}
