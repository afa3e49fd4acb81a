//! Where the raw files come from.

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{InsightsError, Result};

/// Read-only access to the published data files.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch a whole text payload. The body is fully buffered before returning.
    async fn fetch_text(&self, location: &str) -> Result<String>;

    async fn fetch_json(&self, location: &str) -> Result<serde_json::Value> {
        let body = self.fetch_text(location).await?;
        serde_json::from_str(&body).map_err(|source| InsightsError::Json {
            location: location.to_string(),
            source,
        })
    }
}

/// HTTP(S) via `reqwest`; locations without a scheme are local files.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| InsightsError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_text(&self, location: &str) -> Result<String> {
        if !is_remote(location) {
            debug!(location, "reading local file");
            return tokio::fs::read_to_string(location)
                .await
                .map_err(|source| InsightsError::Io {
                    location: location.to_string(),
                    source,
                });
        }

        debug!(location, "fetching");
        let http_err = |source| InsightsError::Http {
            location: location.to_string(),
            source,
        };
        let resp = self.client.get(location).send().await.map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(InsightsError::Status {
                location: location.to_string(),
                status,
            });
        }
        let body = resp.text().await.map_err(http_err)?;
        debug!(location, bytes = body.len(), "downloaded");
        Ok(body)
    }
}
