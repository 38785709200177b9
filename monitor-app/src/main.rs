use anyhow::Result;
use clap::Parser;
use monitor_api::{server::ApiServer, state::AppState};
use monitor_config::ConfigManager;
use monitor_core::MonitorConfig;
use monitor_exchange::UpbitClient;
use monitor_metrics::{AggregatorSettings, MetricsAggregator};
use std::{path::PathBuf, sync::Arc};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Crypto market RSI dashboard", long_about = None)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "CRYPTO_MONITOR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.debug);

    info!("Starting Crypto Monitor dashboard");

    let config = load_config(&args)?;

    let client = UpbitClient::from_config(&config.exchange)?;
    info!("Using market data from {}", client.base_url());

    let aggregator = MetricsAggregator::new(Arc::new(client), AggregatorSettings::from(&config));
    let settings = aggregator.settings();
    info!(
        "Tracking top {} {} markets, {} daily candles, RSI period {}",
        settings.top_n, settings.quote_currency, settings.candle_count, settings.rsi_period
    );
    let state = AppState::new(aggregator);

    let server = ApiServer::new(&config.server, state)?;
    server.run_until(shutdown_signal()).await?;

    info!("Crypto Monitor dashboard stopped");

    Ok(())
}

fn init_logging(debug: bool) {
    let env_filter = if debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(args: &Args) -> Result<MonitorConfig> {
    let mut manager = ConfigManager::load(args.config.as_deref())?;

    if let Some(host) = &args.host {
        manager.get_config_mut().server.host = host.clone();
    }
    if let Some(port) = args.port {
        manager.get_config_mut().server.port = port;
    }

    manager.validate()?;
    Ok(manager.into_config())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        }
    }
}
