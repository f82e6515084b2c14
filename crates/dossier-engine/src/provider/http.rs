//! Shared HTTP client for JSON providers

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::ProviderStatus;
use crate::config::EngineConfig;

/// Thin reqwest wrapper shared by all HTTP providers
#[derive(Debug, Clone)]
pub struct HttpJson {
    client: Client,
}

impl HttpJson {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// GET a JSON document; non-2xx statuses are errors
    pub async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        debug!(url = %url, "Fetching provider document");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("Provider returned an error for {url}"))?;

        response
            .json()
            .await
            .with_context(|| format!("Response from {url} is not valid JSON"))
    }

    /// Status code of a GET, or `UNREACHABLE` on connection failure
    pub async fn ping(&self, url: &str) -> ProviderStatus {
        match self.client.get(url).send().await {
            Ok(response) => ProviderStatus(response.status().as_u16()),
            Err(e) => {
                debug!(url = %url, error = %e, "Provider ping failed");
                ProviderStatus::UNREACHABLE
            }
        }
    }
}
