pub mod aggregator;
pub mod rsi;

pub use aggregator::{build_metrics, price_change, AggregatorSettings, MetricsAggregator};
pub use rsi::{calculate_rsi, round_to_cents, RsiZone, DEFAULT_RSI_PERIOD};
