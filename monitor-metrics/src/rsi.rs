pub const DEFAULT_RSI_PERIOD: usize = 14;

pub const NEUTRAL_RSI: f64 = 50.0;

pub const OVERBOUGHT_THRESHOLD: f64 = 70.0;
pub const OVERSOLD_THRESHOLD: f64 = 30.0;

/// Relative Strength Index over simple averages of the first `period` changes.
///
/// `prices` are ordered newest first, as delivered by the candle endpoint.
/// The series is walked oldest first, so only the oldest `period + 1`
/// observations take part. Returns 50 when there is not enough data and 100
/// when there were no losses. The result is rounded to two decimals.
pub fn calculate_rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;

    let oldest_first: Vec<f64> = prices.iter().rev().copied().collect();
    for pair in oldest_first.windows(2).take(period) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    round_to_cents(100.0 - (100.0 / (1.0 + rs)))
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi > OVERBOUGHT_THRESHOLD {
            RsiZone::Overbought
        } else if rsi < OVERSOLD_THRESHOLD {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }
}
