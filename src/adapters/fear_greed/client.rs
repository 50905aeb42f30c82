//! Fear & Greed Client
//!
//! Crypto Fear & Greed index from alternative.me. Readings arrive newest
//! first with every number encoded as a string.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::adapters::http::{build_client, get_json, require_positive};
use crate::domain::records::{FearGreedReading, FearGreedWindow};
use crate::ports::provider::{ProviderError, SentimentSource, Source};

pub const DEFAULT_BASE_URL: &str = "https://api.alternative.me";

#[derive(Debug, Clone, Deserialize)]
pub struct FngResponse {
    pub data: Vec<FngEntry>,
    #[serde(default)]
    pub metadata: Option<FngMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FngMetadata {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FngEntry {
    pub value: String,
    #[serde(default)]
    pub value_classification: Option<String>,
    pub timestamp: String,
}

impl FngEntry {
    pub fn into_reading(self) -> Result<FearGreedReading, ProviderError> {
        let value: u8 = self
            .value
            .trim()
            .parse()
            .ok()
            .filter(|v| *v <= 100)
            .ok_or_else(|| {
                ProviderError::malformed(format!("fear & greed value '{}' is not in 0..=100", self.value))
            })?;

        let secs: i64 = self
            .timestamp
            .trim()
            .parse()
            .map_err(|_| ProviderError::malformed(format!("bad timestamp '{}'", self.timestamp)))?;
        let timestamp = Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| ProviderError::malformed(format!("timestamp {} out of range", secs)))?;

        let label = self
            .value_classification
            .unwrap_or_else(|| FearGreedReading::label_for(value).to_string());

        Ok(FearGreedReading {
            value,
            label,
            timestamp,
        })
    }
}

impl FngResponse {
    pub fn into_window(self) -> Result<FearGreedWindow, ProviderError> {
        if let Some(error) = self.metadata.and_then(|m| m.error) {
            return Err(ProviderError::UpstreamUnavailable(error));
        }
        if self.data.is_empty() {
            return Err(ProviderError::malformed("fear & greed response has no readings"));
        }

        let readings = self
            .data
            .into_iter()
            .map(FngEntry::into_reading)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FearGreedWindow { readings })
    }
}

#[derive(Debug, Clone)]
pub struct FearGreedConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for FearGreedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(8),
        }
    }
}

/// alternative.me sentiment client
#[derive(Debug, Clone)]
pub struct FearGreedClient {
    config: FearGreedConfig,
    http: Client,
}

impl FearGreedClient {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(FearGreedConfig::default())
    }

    pub fn with_config(config: FearGreedConfig) -> Result<Self, ProviderError> {
        let http = build_client(config.timeout)?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl SentimentSource for FearGreedClient {
    fn source(&self) -> Source {
        Source::AlternativeMe
    }

    async fn fetch_fear_greed(&self, limit: u32) -> Result<FearGreedWindow, ProviderError> {
        let limit = require_positive("limit", limit)?;
        let url = format!("{}/fng/", self.config.base_url.trim_end_matches('/'));
        let request = self.http.get(url).query(&[("limit", limit.to_string())]);

        let body: FngResponse = get_json(request, self.config.timeout).await?;
        body.into_window()
    }
}
