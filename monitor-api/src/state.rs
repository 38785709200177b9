use monitor_core::{CoinMetrics, Result};
use monitor_metrics::MetricsAggregator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<MetricsAggregator>,
}

impl AppState {
    pub fn new(aggregator: MetricsAggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }

    pub async fn collect_metrics(&self) -> Result<Vec<CoinMetrics>> {
        self.aggregator.collect().await
    }
}
