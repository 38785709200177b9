use crate::rsi::{calculate_rsi, DEFAULT_RSI_PERIOD};
use futures::future::join_all;
use monitor_core::{CandleRecord, CoinMetrics, MarketInfo, MonitorConfig, Result};
use monitor_exchange::MarketDataSource;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub quote_currency: String,
    pub top_n: usize,
    pub candle_count: usize,
    pub rsi_period: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            quote_currency: "KRW".to_string(),
            top_n: 30,
            candle_count: 15,
            rsi_period: DEFAULT_RSI_PERIOD,
        }
    }
}

impl From<&MonitorConfig> for AggregatorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            quote_currency: config.exchange.quote_currency.clone(),
            top_n: config.exchange.top_n,
            candle_count: config.exchange.candle_count,
            rsi_period: config.indicator.rsi_period,
        }
    }
}

/// Builds one [`CoinMetrics`] per eligible market from live upstream data.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    source: Arc<dyn MarketDataSource>,
    settings: AggregatorSettings,
}

impl MetricsAggregator {
    pub fn new(source: Arc<dyn MarketDataSource>, settings: AggregatorSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Fetches the market list, then the candles of every candidate market
    /// concurrently. A market whose candles cannot be fetched is skipped; only
    /// a market list failure is returned as an error. The output order is
    /// unspecified.
    pub async fn collect(&self) -> Result<Vec<CoinMetrics>> {
        let markets = self.source.fetch_markets().await?;
        let candidates = self.select_candidates(markets);
        let total = candidates.len();

        let handles: Vec<_> = candidates
            .into_iter()
            .map(|market| {
                let source = Arc::clone(&self.source);
                let count = self.settings.candle_count;
                let period = self.settings.rsi_period;
                tokio::spawn(async move {
                    let built = source
                        .fetch_daily_candles(&market.market, count)
                        .await
                        .map(|candles| build_metrics(&market, &candles, period));
                    (market, built)
                })
            })
            .collect();

        let mut metrics = Vec::with_capacity(total);
        for joined in join_all(handles).await {
            match joined {
                Ok((market, Ok(Some(built)))) => {
                    debug!("Built metrics for {}", market.market);
                    metrics.push(built);
                }
                Ok((market, Ok(None))) => {
                    debug!("Skipping {}: fewer than 2 candles", market.market);
                }
                Ok((market, Err(e))) => {
                    warn!("Failed to fetch candles for {}: {}", market.market, e);
                }
                Err(e) => {
                    error!("Candle task failed: {}", e);
                }
            }
        }

        info!(
            "Collected metrics for {}/{} {} markets from {}",
            metrics.len(),
            total,
            self.settings.quote_currency,
            self.source.name()
        );

        Ok(metrics)
    }

    fn select_candidates(&self, markets: Vec<MarketInfo>) -> Vec<MarketInfo> {
        markets
            .into_iter()
            .filter(|m| m.has_quote_currency(&self.settings.quote_currency))
            .take(self.settings.top_n)
            .collect()
    }
}

/// Builds the metrics record of `market` from its newest-first candles.
/// Returns `None` when fewer than two candles are available.
pub fn build_metrics(
    market: &MarketInfo,
    candles: &[CandleRecord],
    rsi_period: usize,
) -> Option<CoinMetrics> {
    let [current, previous, ..] = candles else {
        return None;
    };

    let (price_change_24h, price_change_percentage_24h) =
        price_change(current.trade_price, previous.trade_price);

    let prices: Vec<f64> = candles.iter().map(|c| c.trade_price).collect();

    Some(CoinMetrics {
        market: market.market.clone(),
        name: market.display_name().to_string(),
        current_price: current.trade_price,
        volume_24h: current.candle_acc_trade_volume,
        rsi: calculate_rsi(&prices, rsi_period),
        price_change_24h,
        price_change_percentage_24h,
    })
}

/// Absolute and percent change from `previous` to `current`. The percent
/// change is `None` when `previous` is zero.
pub fn price_change(current: f64, previous: f64) -> (f64, Option<f64>) {
    let change = current - previous;
    let percent = if previous == 0.0 {
        None
    } else {
        Some(change / previous * 100.0)
    };
    (change, percent)
}
