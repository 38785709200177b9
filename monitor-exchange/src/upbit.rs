use crate::MarketDataSource;
use async_trait::async_trait;
use monitor_core::{CandleRecord, ExchangeConfig, MarketInfo, MonitorError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct UpbitClient {
    base_url: String,
    client: Client,
}

impl UpbitClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                debug!("Failed to read error body from {}: {}", url, e);
                String::new()
            });
            return Err(MonitorError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MarketDataSource for UpbitClient {
    async fn fetch_markets(&self) -> Result<Vec<MarketInfo>> {
        self.get_json("/market/all", &[("isDetails", "false")]).await
    }

    async fn fetch_daily_candles(&self, market: &str, count: usize) -> Result<Vec<CandleRecord>> {
        let count = count.to_string();
        self.get_json(
            "/candles/days",
            &[("market", market), ("count", count.as_str())],
        )
        .await
    }

    fn name(&self) -> &str {
        "Upbit"
    }
}
