//! HTTP client for the backend `/selectors` endpoint.

use std::time::Duration;

use tracing::debug;

use super::DynamicSelectorConfig;
use crate::error::{Error, Result};

pub struct SelectorClient {
    client: reqwest::Client,
    base_url: String,
}

impl SelectorClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Uses an existing client (shared connection pool, custom timeouts).
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/selectors", self.base_url)
    }

    /// Fetch the current selector overrides.
    ///
    /// Transport failures and non-success statuses are errors; a body that
    /// parses as JSON but has the wrong shape degrades to whatever entries
    /// are usable.
    pub async fn fetch(&self) -> Result<DynamicSelectorConfig> {
        let endpoint = self.endpoint();
        let resp = self.client.get(&endpoint).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        let config = DynamicSelectorConfig::from_value_lenient(value);
        debug!(endpoint = endpoint.as_str(), hosts = config.entries.len(), "fetched selectors");
        Ok(config)
    }
}
