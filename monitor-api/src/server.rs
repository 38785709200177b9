use crate::{handlers, state::AppState};
use axum::{routing::get, Router};
use monitor_core::{MonitorError, Result, ServerConfig};
use std::{future::Future, net::SocketAddr};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// `/api/metrics` serves JSON; every other path serves the HTML dashboard.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/metrics", get(handlers::get_metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    api.fallback(handlers::get_dashboard).with_state(state)
}

pub struct ApiServer {
    app: Router,
    addr: SocketAddr,
}

impl ApiServer {
    pub fn new(config: &ServerConfig, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| {
                MonitorError::Configuration(format!(
                    "invalid listen address {}:{}: {}",
                    config.host, config.port, e
                ))
            })?;

        Ok(Self {
            app: build_router(state),
            addr,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| MonitorError::Other(e.to_string()))?;

        info!("API server listening on {}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| MonitorError::Other(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::IntoResponse,
    };
    use monitor_core::{CandleRecord, MarketInfo};
    use monitor_exchange::MarketDataSource;
    use monitor_metrics::{AggregatorSettings, MetricsAggregator};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct FixtureSource {
        error: Option<String>,
    }

    #[async_trait]
    impl MarketDataSource for FixtureSource {
        async fn fetch_markets(&self) -> Result<Vec<MarketInfo>> {
            if let Some(message) = &self.error {
                return Err(MonitorError::Other(message.clone()));
            }
            Ok(["KRW-BTC", "KRW-ETH", "KRW-XRP", "BTC-ETH"]
                .iter()
                .map(|m| MarketInfo {
                    market: m.to_string(),
                    korean_name: String::new(),
                    english_name: m.trim_start_matches("KRW-").to_string(),
                })
                .collect())
        }

        async fn fetch_daily_candles(&self, market: &str, _count: usize) -> Result<Vec<CandleRecord>> {
            // (newest price, previous price, volume)
            let (newest, previous, volume) = match market {
                "KRW-BTC" => (110.0, 100.0, 5.0),
                "KRW-ETH" => (90.0, 100.0, 50.0),
                _ => {
                    return Err(MonitorError::Upstream {
                        status: 500,
                        body: "boom".to_string(),
                    })
                }
            };
            Ok([newest, previous]
                .iter()
                .map(|price| CandleRecord {
                    market: market.to_string(),
                    candle_date_time_utc: None,
                    opening_price: *price,
                    high_price: *price,
                    low_price: *price,
                    trade_price: *price,
                    candle_acc_trade_volume: volume,
                    timestamp: 0,
                })
                .collect())
        }

        fn name(&self) -> &str {
            "fixture"
        }
    }

    fn app(error: Option<&str>) -> Router {
        let source = FixtureSource {
            error: error.map(str::to_string),
        };
        let aggregator = MetricsAggregator::new(Arc::new(source), AggregatorSettings::default());
        build_router(AppState::new(aggregator))
    }

    async fn send_get(app: Router, uri: &str) -> (StatusCode, header::HeaderMap, String) {
        let req = Request::builder()
            .uri(uri)
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_api_metrics_returns_json_with_cors() {
        let (status, headers, body) = send_get(app(None), "/api/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let rows: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        let mut markets: Vec<&str> = rows.iter().filter_map(|r| r["market"].as_str()).collect();
        markets.sort();
        assert_eq!(markets, vec!["KRW-BTC", "KRW-ETH"]);
    }

    #[tokio::test]
    async fn test_dashboard_sorted_by_volume_by_default() {
        let (status, headers, body) = send_get(app(None), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let eth = body.find("KRW-ETH").unwrap();
        let btc = body.find("KRW-BTC").unwrap();
        assert!(eth < btc);
        assert!(!body.contains("KRW-XRP"));
    }

    #[tokio::test]
    async fn test_dashboard_sorted_by_change() {
        let (status, _, body) = send_get(app(None), "/?sort=change").await;

        assert_eq!(status, StatusCode::OK);
        let eth = body.find("KRW-ETH").unwrap();
        let btc = body.find("KRW-BTC").unwrap();
        assert!(btc < eth);
        assert!(body.contains("+10.00%"));
        assert!(body.contains("-10.00%"));
    }

    #[tokio::test]
    async fn test_any_other_path_serves_dashboard() {
        let (status, _, body) = send_get(app(None), "/some/other/path?sort=rsi").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<table>"));
    }

    #[tokio::test]
    async fn test_repeated_sort_parameter_uses_first_value() {
        let (status, headers, body) = send_get(app(None), "/?sort=change&sort=volume").await;

        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert!(body.contains("<th class=\"active\"><a href=\"/?sort=change\">"));
        let eth = body.find("KRW-ETH").unwrap();
        let btc = body.find("KRW-BTC").unwrap();
        assert!(btc < eth);

        let (status, _, _) = send_get(app(None), "/?sort=rsi&sort=rsi").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failures_return_plain_text_500() {
        for uri in ["/api/metrics", "/"] {
            let (status, headers, body) = send_get(app(Some("market list unavailable")), uri).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(headers[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain"));
            assert_eq!(body, "Other error: market list unavailable");
        }
    }

    #[tokio::test]
    async fn test_empty_error_message_becomes_unknown_error() {
        let resp = crate::ApiError::internal("").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"unknown error");
    }

    #[test]
    fn test_server_rejects_bad_host() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            port: 8080,
        };
        let aggregator = MetricsAggregator::new(
            Arc::new(FixtureSource { error: None }),
            AggregatorSettings::default(),
        );

        assert!(ApiServer::new(&config, AppState::new(aggregator)).is_err());
    }
}
