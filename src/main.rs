use std::sync::Arc;

use copytrader::api::router::create_router;
use copytrader::config::AppConfig;
use copytrader::db::{self, PgLedger};
use copytrader::ledger::{MemoryLedger, TradeLedger};
use copytrader::polymarket::{
    ClobTradingPort, DataClient, GammaClient, PolymarketMarketData, PolymarketWallet,
};
use copytrader::ports::TradingPort;
use copytrader::{build_controller, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing(config.json_logs);

    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = metrics::init_metrics()?;

    let ledger: Arc<dyn TradeLedger> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::init_pool(url).await?;
            db::migrate(&pool).await?;
            tracing::info!("Database connected, migrations applied");
            Arc::new(PgLedger::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory ledger (state is lost on exit)");
            Arc::new(MemoryLedger::new())
        }
    };

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()?;
    let market_data = Arc::new(PolymarketMarketData::new(
        DataClient::new(http.clone(), config.data_api_url.clone()),
        GammaClient::new(http, config.gamma_api_url.clone()),
        config.trade_fetch_limit,
    ));

    let trading: Option<Arc<dyn TradingPort>> = match &config.private_key {
        Some(key) => {
            let wallet = PolymarketWallet::connect(&config.clob_url, key).await?;
            tracing::info!(wallet = %wallet.wallet_address(), "CLOB wallet authenticated");
            Some(Arc::new(ClobTradingPort::new(Arc::new(wallet))))
        }
        None => {
            tracing::warn!("No POLYMARKET_PRIVATE_KEY set, LIVE orders will fail");
            None
        }
    };

    let controller = build_controller(&config, ledger.clone(), market_data, trading);
    controller.restore().await?;

    if config.api_token.is_none() {
        tracing::warn!("API_TOKEN not set, control API is unauthenticated");
    }

    let state = AppState {
        ledger,
        controller: controller.clone(),
        config,
        metrics_handle: Some(metrics_handle),
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
