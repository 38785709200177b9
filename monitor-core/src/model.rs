use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An entry of the upstream market list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Exchange-qualified symbol, e.g. `KRW-BTC`.
    pub market: String,
    #[serde(default)]
    pub korean_name: String,
    #[serde(default)]
    pub english_name: String,
}

impl MarketInfo {
    pub fn display_name(&self) -> &str {
        if self.korean_name.is_empty() {
            &self.english_name
        } else {
            &self.korean_name
        }
    }

    pub fn has_quote_currency(&self, quote_currency: &str) -> bool {
        self.market
            .strip_prefix(quote_currency)
            .is_some_and(|rest| rest.starts_with('-'))
    }
}

/// One daily candle, as returned newest-first by the upstream candle endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleRecord {
    pub market: String,
    #[serde(default)]
    pub candle_date_time_utc: Option<NaiveDateTime>,
    #[serde(default)]
    pub opening_price: f64,
    #[serde(default)]
    pub high_price: f64,
    #[serde(default)]
    pub low_price: f64,
    pub trade_price: f64,
    pub candle_acc_trade_volume: f64,
    /// Milliseconds since the Unix epoch of the last trade in the bucket.
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMetrics {
    pub market: String,
    pub name: String,
    pub current_price: f64,
    pub volume_24h: f64,
    pub rsi: f64,
    pub price_change_24h: f64,
    /// `None` when the previous close is zero.
    pub price_change_percentage_24h: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_english() {
        let market = MarketInfo {
            market: "KRW-BTC".to_string(),
            korean_name: String::new(),
            english_name: "Bitcoin".to_string(),
        };
        assert_eq!(market.display_name(), "Bitcoin");

        let market = MarketInfo {
            korean_name: "비트코인".to_string(),
            ..market
        };
        assert_eq!(market.display_name(), "비트코인");
    }

    #[test]
    fn test_quote_currency_prefix() {
        let market = |m: &str| MarketInfo {
            market: m.to_string(),
            korean_name: String::new(),
            english_name: String::new(),
        };

        assert!(market("KRW-BTC").has_quote_currency("KRW"));
        assert!(!market("BTC-ETH").has_quote_currency("KRW"));
        assert!(!market("KRWX-ETH").has_quote_currency("KRW"));
        assert!(!market("KRW").has_quote_currency("KRW"));
    }

    #[test]
    fn test_decode_upstream_candle() {
        let json = r#"{
            "market": "KRW-BTC",
            "candle_date_time_utc": "2024-03-01T00:00:00",
            "candle_date_time_kst": "2024-03-01T09:00:00",
            "opening_price": 85000000.0,
            "high_price": 87000000.0,
            "low_price": 84000000.0,
            "trade_price": 86500000.0,
            "timestamp": 1709337599000,
            "candle_acc_trade_price": 100000000000.0,
            "candle_acc_trade_volume": 1234.5,
            "prev_closing_price": 85000000.0,
            "change_price": 1500000.0,
            "change_rate": 0.0176
        }"#;

        let candle: CandleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(candle.market, "KRW-BTC");
        assert_eq!(candle.trade_price, 86500000.0);
        assert_eq!(candle.candle_acc_trade_volume, 1234.5);
        assert_eq!(candle.timestamp, 1709337599000);
        assert!(candle.candle_date_time_utc.is_some());
    }

    #[test]
    fn test_undefined_percent_change_serializes_as_null() {
        let metrics = CoinMetrics {
            market: "KRW-NEW".to_string(),
            name: "New".to_string(),
            current_price: 50.0,
            volume_24h: 1.0,
            rsi: 50.0,
            price_change_24h: 50.0,
            price_change_percentage_24h: None,
        };

        let value = serde_json::to_value(&metrics).unwrap();
        assert!(value["price_change_percentage_24h"].is_null());
        assert_eq!(value["volume_24h"], 1.0);
    }
}
