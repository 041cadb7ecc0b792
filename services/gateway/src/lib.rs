//! Tipjar Gateway
//!
//! HTTP entry point for the donation backend: checkout session creation,
//! processor webhooks into the ledger, and the leaderboard read surface.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod processor;
pub mod recaptcha;
pub mod webhook;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use config::GatewayConfig;
use processor::ProcessorClient;
use recaptcha::RecaptchaVerifier;
use tipjar_ledger::LedgerStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub processor: Arc<ProcessorClient>,
    pub verifier: Arc<RecaptchaVerifier>,
    pub config: Arc<GatewayConfig>,
}

/// Build the gateway router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/webhook", post(handlers::handle_webhook))
        .route(
            "/create-checkout-session",
            post(handlers::create_checkout_session),
        )
        .route("/payments/:id", get(handlers::get_payment))
        .route("/leaderboard", get(handlers::get_leaderboard))
        .route("/stats", get(handlers::get_stats))
        .layer(cors)
        .with_state(state)
}
