use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::core::{Config, ValidationReport};

/// Read-only access to previously stored reports
#[derive(Debug, Clone)]
pub struct HistoryClient {
    url: Url,
    client: Client,
}

impl HistoryClient {
    pub fn new(url: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { url, client })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.service.history_url()?)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch every stored report, surfacing failures
    pub async fn fetch(&self) -> Result<Vec<ValidationReport>> {
        let response = self
            .client
            .get(self.url.clone())
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("History request failed: {}", response.status()));
        }

        Ok(response.json::<Vec<ValidationReport>>().await?)
    }

    /// Fetch every stored report. History is supplementary, so any failure is
    /// logged and yields an empty list.
    pub async fn list(&self) -> Vec<ValidationReport> {
        match self.fetch().await {
            Ok(reports) => {
                tracing::info!("Fetched {} history entries from {}", reports.len(), self.url);
                reports
            }
            Err(e) => {
                tracing::warn!("Failed to fetch history from {}: {:#}", self.url, e);
                Vec::new()
            }
        }
    }
}
