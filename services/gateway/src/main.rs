// Tipjar Gateway Service - donation checkout, webhook ingestion, leaderboard

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tipjar_gateway::config::GatewayConfig;
use tipjar_gateway::processor::ProcessorClient;
use tipjar_gateway::recaptcha::RecaptchaVerifier;
use tipjar_gateway::{app, AppState};
use tipjar_ledger::{Config as LedgerConfig, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting Tipjar gateway");

    let config = GatewayConfig::from_env()?;

    let ledger_config = LedgerConfig::from_env();
    info!("Opening ledger at {:?}", ledger_config.data_dir);
    let store = Arc::new(Storage::open(&ledger_config)?);

    let processor = Arc::new(ProcessorClient::new(
        config.processor_api_base.clone(),
        config.processor_secret_key.clone(),
        config.processor_webhook_secret.clone(),
    ));

    let verifier = Arc::new(RecaptchaVerifier::new(
        config.recaptcha_verify_url.clone(),
        config.recaptcha_secret.clone(),
        config.recaptcha_min_score,
    ));
    if !verifier.enabled() {
        info!("Bot verification disabled (no RECAPTCHA_SECRET configured)");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        store,
        processor,
        verifier,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Gateway listening on: {}", bind_addr);
    info!("   POST /create-checkout-session - Start a donation checkout");
    info!("   POST /webhook - Payment processor event delivery");
    info!("   GET  /payments/:id - Look up one recorded donation");
    info!("   GET  /leaderboard - Ranked donor leaderboard");
    info!("   GET  /stats - Tier counts and ledger size");
    info!("   GET  /health - Health check");
    info!("   GET  /metrics - Prometheus metrics");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
