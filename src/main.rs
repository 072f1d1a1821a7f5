use anyhow::Context;
use aurum::sources::{MarketDataSource, Notifier, TelegramClient, TwelveDataClient};
use aurum::{api, Bot, Config};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Buffered commands awaiting the bot task.
const COMMAND_QUEUE_SIZE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aurum=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    let token = config
        .telegram
        .token
        .clone()
        .context("TELEGRAM_BOT_TOKEN is not set")?;
    info!(
        "Starting Aurum for {} on {:?}",
        config.market.symbol, config.market.timeframes
    );

    let market: Arc<dyn MarketDataSource> = Arc::new(TwelveDataClient::new(&config.market)?);
    let telegram = Arc::new(TelegramClient::new(&config.telegram, &token)?);
    let notifier: Arc<dyn Notifier> = telegram.clone();

    // Commands flow from the poller to the bot task
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
    let _poller = telegram.spawn_poller(command_tx);

    // Keep-alive server
    let app = api::router().layer(TraceLayer::new_for_http());
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Keep-alive server listening on {}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Keep-alive server error: {}", e);
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    Bot::new(config, market, notifier)
        .run(command_rx, shutdown)
        .await;

    info!("Aurum stopped");
    Ok(())
}
