pub mod upbit;

pub use upbit::UpbitClient;

use async_trait::async_trait;
use monitor_core::{CandleRecord, MarketInfo, Result};
use std::fmt::Debug;

/// Read-only access to an exchange's market list and daily candles.
#[async_trait]
pub trait MarketDataSource: Send + Sync + Debug {
    async fn fetch_markets(&self) -> Result<Vec<MarketInfo>>;

    /// Returns up to `count` daily candles for `market`, newest first.
    async fn fetch_daily_candles(&self, market: &str, count: usize) -> Result<Vec<CandleRecord>>;

    fn name(&self) -> &str;
}
