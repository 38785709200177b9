use chrono::{DateTime, Utc};
use monitor_core::{CoinMetrics, MonitorError, Result};
use monitor_metrics::RsiZone;
use std::{cmp::Ordering, fmt::Write};
use tracing::debug;

pub const DEFAULT_SORT_KEY: &str = "volume";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Volume,
    Rsi,
    Change,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Volume, SortKey::Rsi, SortKey::Change];

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "volume" => Some(SortKey::Volume),
            "rsi" => Some(SortKey::Rsi),
            "change" => Some(SortKey::Change),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Volume => "volume",
            SortKey::Rsi => "rsi",
            SortKey::Change => "change",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SortKey::Volume => "24h Volume",
            SortKey::Rsi => "RSI",
            SortKey::Change => "24h Change",
        }
    }

    /// Descending order on the field this key names.
    fn compare(&self, a: &CoinMetrics, b: &CoinMetrics) -> Ordering {
        match self {
            SortKey::Volume => b.volume_24h.total_cmp(&a.volume_24h),
            SortKey::Rsi => b.rsi.total_cmp(&a.rsi),
            SortKey::Change => {
                match (a.price_change_percentage_24h, b.price_change_percentage_24h) {
                    (Some(a), Some(b)) => b.total_cmp(&a),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        }
    }
}

/// Sorts `metrics` in descending order of the field named by `key`. Unknown
/// keys leave the order untouched. Returns the key that was applied.
pub fn sort_metrics(metrics: &mut [CoinMetrics], key: &str) -> Option<SortKey> {
    let Some(sort_key) = SortKey::parse(key) else {
        debug!("Unknown sort key {:?}, keeping upstream order", key);
        return None;
    };

    metrics.sort_by(|a, b| sort_key.compare(a, b));
    Some(sort_key)
}

pub fn render_json(metrics: &[CoinMetrics]) -> Result<String> {
    Ok(serde_json::to_string(metrics)?)
}

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2rem; background: #0f172a; color: #e2e8f0; }
h1 { font-size: 1.5rem; margin-bottom: 0.25rem; }
.updated { color: #94a3b8; font-size: 0.85rem; margin-bottom: 1.5rem; }
table { border-collapse: collapse; width: 100%; }
th, td { padding: 0.6rem 0.8rem; border-bottom: 1px solid #1e293b; text-align: right; }
th:first-child, td:first-child { text-align: left; }
th a { color: #cbd5e1; text-decoration: none; }
th.active a { color: #38bdf8; }
.market { color: #64748b; font-size: 0.8rem; }
.positive { color: #ef4444; }
.negative { color: #3b82f6; }
.neutral { color: #94a3b8; }
.rsi-overbought { color: #f97316; font-weight: 600; }
.rsi-oversold { color: #22c55e; font-weight: 600; }
.rsi-neutral { color: #e2e8f0; }
"#;

/// Renders the dashboard page. `sort_key` only drives header highlighting;
/// `metrics` are expected to be sorted already.
pub fn render_dashboard(
    metrics: &[CoinMetrics],
    sort_key: &str,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    write_dashboard(metrics, SortKey::parse(sort_key), generated_at)
        .map_err(|e| MonitorError::Render(e.to_string()))
}

fn write_dashboard(
    metrics: &[CoinMetrics],
    active: Option<SortKey>,
    generated_at: DateTime<Utc>,
) -> std::result::Result<String, std::fmt::Error> {
    let mut html = String::with_capacity(4096 + metrics.len() * 512);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\">")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
    )?;
    writeln!(html, "<title>Crypto Market Dashboard</title>")?;
    writeln!(html, "<style>{STYLE}</style>")?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;
    writeln!(html, "<h1>Crypto Market Dashboard</h1>")?;
    writeln!(
        html,
        "<div class=\"updated\">Updated {} &middot; {} markets</div>",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        metrics.len()
    )?;

    writeln!(html, "<table>")?;
    writeln!(html, "<thead><tr>")?;
    writeln!(html, "<th>Coin</th>")?;
    writeln!(html, "<th>Price</th>")?;
    for key in SortKey::ALL {
        let class = if Some(key) == active { " class=\"active\"" } else { "" };
        writeln!(
            html,
            "<th{class}><a href=\"/?sort={}\">{}</a></th>",
            key.as_str(),
            key.label()
        )?;
    }
    writeln!(html, "</tr></thead>")?;

    writeln!(html, "<tbody>")?;
    for coin in metrics {
        write_row(&mut html, coin)?;
    }
    writeln!(html, "</tbody>")?;
    writeln!(html, "</table>")?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;

    Ok(html)
}

fn write_row(html: &mut String, coin: &CoinMetrics) -> std::fmt::Result {
    let change_class = change_class(coin.price_change_percentage_24h);
    let percent = match coin.price_change_percentage_24h {
        Some(p) => format!("{p:+.2}%"),
        None => "-".to_string(),
    };

    writeln!(html, "<tr>")?;
    writeln!(
        html,
        "<td>{} <span class=\"market\">{}</span></td>",
        escape_html(&coin.name),
        escape_html(&coin.market)
    )?;
    writeln!(html, "<td>{}</td>", format_price(coin.current_price))?;
    writeln!(html, "<td>{}</td>", format_number(coin.volume_24h, 2))?;
    writeln!(
        html,
        "<td class=\"{}\">{}</td>",
        rsi_class(coin.rsi),
        format_number(coin.rsi, 2)
    )?;
    writeln!(
        html,
        "<td class=\"{change_class}\">{} ({percent})</td>",
        format_signed(coin.price_change_24h)
    )?;
    writeln!(html, "</tr>")
}

fn rsi_class(rsi: f64) -> &'static str {
    match RsiZone::classify(rsi) {
        RsiZone::Overbought => "rsi-overbought",
        RsiZone::Oversold => "rsi-oversold",
        RsiZone::Neutral => "rsi-neutral",
    }
}

fn change_class(percent: Option<f64>) -> &'static str {
    match percent {
        Some(p) if p >= 0.0 => "positive",
        Some(_) => "negative",
        None => "neutral",
    }
}

fn price_decimals(value: f64) -> usize {
    let abs = value.abs();
    if abs >= 1000.0 {
        0
    } else if abs >= 1.0 || abs == 0.0 {
        2
    } else {
        4
    }
}

fn format_price(value: f64) -> String {
    format_number(value, price_decimals(value))
}

fn format_signed(value: f64) -> String {
    let formatted = format_number(value, price_decimals(value));
    if value > 0.0 {
        format!("+{formatted}")
    } else {
        formatted
    }
}

/// Fixed-point formatting with `,` thousands separators.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
