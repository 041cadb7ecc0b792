// HTTP handlers for the Tipjar gateway.
// Every handler returns a typed result; GatewayError does the wire mapping.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tipjar_ledger::{aggregate, PaymentEntry, Tier};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::metrics::METRICS;
use crate::webhook::{normalize, WebhookEvent};
use crate::AppState;

/// Minimum accepted donation, in major units
const MIN_AMOUNT: Decimal = dec!(0.50);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub store_ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub name: Option<String>,
    /// Accepted as JSON string or number; parsed as exact decimal either way
    pub amount: Option<serde_json::Value>,
    /// Bot-verification token, required only when verification is enabled
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Raw ledger entry count (individual payments)
    pub total_entries: usize,
    /// Distinct donors on the leaderboard
    pub donors: usize,
    pub tiers: TierCounts,
}

#[derive(Debug, Default, Serialize)]
pub struct TierCounts {
    pub whale: u64,
    pub shark: u64,
    pub shrimp: u64,
    pub unknown: u64,
}

// Liveness endpoint
pub async fn index() -> &'static str {
    "Tipjar donation gateway"
}

// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_ok = state.store.get_payment("__health__").is_ok();

    Json(HealthResponse {
        status: if store_ok { "healthy" } else { "degraded" },
        service: "tipjar-gateway",
        version: env!("CARGO_PKG_VERSION"),
        store_ok,
    })
}

// Prometheus metrics endpoint
pub async fn metrics_handler() -> Result<String, GatewayError> {
    METRICS
        .export()
        .map_err(|e| GatewayError::Internal(format!("Failed to export metrics: {}", e)))
}

/// Parse a request amount into processor minor units (cents).
///
/// "25.50" maps to 2550. Sub-minimum and sub-cent amounts are rejected.
pub(crate) fn parse_amount_minor(value: &serde_json::Value) -> Result<u64, GatewayError> {
    let amount: Decimal = match value {
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| GatewayError::Validation(format!("Invalid amount: {}", s)))?,
        serde_json::Value::Number(n) => n
            .to_string()
            .parse()
            .map_err(|_| GatewayError::Validation(format!("Invalid amount: {}", n)))?,
        _ => {
            return Err(GatewayError::Validation(
                "amount must be a number".to_string(),
            ))
        }
    };

    if amount < MIN_AMOUNT {
        return Err(GatewayError::Validation(format!(
            "amount must be at least {}",
            MIN_AMOUNT
        )));
    }

    let minor = amount * Decimal::from(100);
    if !minor.fract().is_zero() {
        return Err(GatewayError::Validation(
            "amount must have at most two decimal places".to_string(),
        ));
    }

    minor
        .to_u64()
        .ok_or_else(|| GatewayError::Validation("amount out of range".to_string()))
}

// Checkout session creation: validate, verify the token, then hand off to
// the processor with {name, paymentId} planted in session metadata.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, GatewayError> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| GatewayError::Validation("name is required".to_string()))?;

    let amount_value = req
        .amount
        .as_ref()
        .ok_or_else(|| GatewayError::Validation("amount is required".to_string()))?;
    let amount_minor = parse_amount_minor(amount_value)?;

    if state.verifier.enabled() {
        let token = req
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::Validation("token is required".to_string()))?;

        let passed = state
            .verifier
            .verify(token)
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;
        if !passed {
            return Err(GatewayError::Forbidden(
                "bot verification failed".to_string(),
            ));
        }
    }

    // Assigned here so the completion webhook has a stable ledger key
    let payment_id = Uuid::new_v4().to_string();

    let session_id = state
        .processor
        .create_checkout_session(
            name,
            &payment_id,
            amount_minor,
            &state.config.currency,
            &state.config.checkout_success_url,
            &state.config.checkout_cancel_url,
        )
        .await
        .map_err(|e| {
            error!(error = %e, "Checkout session creation failed");
            GatewayError::Upstream(e.to_string())
        })?;

    METRICS.checkout_sessions_created_total.inc();
    info!(session_id = %session_id, payment_id = %payment_id, amount_minor, "Checkout session created");

    Ok(Json(SessionResponse { id: session_id }))
}

// Webhook delivery from the payment processor. Signature is verified before
// the body is trusted; unrecognized kinds are acknowledged and ignored.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, GatewayError> {
    METRICS.webhook_events_total.inc();

    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            METRICS.webhook_signature_failures_total.inc();
            GatewayError::SignatureRejected("missing signature header".to_string())
        })?;

    let verified = state
        .processor
        .verify_webhook_signature(body.as_bytes(), signature)
        .map_err(|e| {
            METRICS.webhook_signature_failures_total.inc();
            GatewayError::SignatureRejected(e.to_string())
        })?;
    if !verified {
        METRICS.webhook_signature_failures_total.inc();
        return Err(GatewayError::SignatureRejected(
            "signature verification failed".to_string(),
        ));
    }

    match WebhookEvent::parse(&body).map_err(GatewayError::Validation)? {
        WebhookEvent::Ignored(kind) => {
            debug!(kind = %kind, "Ignoring webhook event kind");
            METRICS.webhook_events_ignored_total.inc();
        }
        WebhookEvent::CheckoutCompleted(session) => {
            // Zero or negative totals (free or refunded sessions) never enter
            // the ledger; the delivery is still acknowledged.
            if session.amount_total <= 0 {
                warn!(
                    session_id = %session.id,
                    amount_total = session.amount_total,
                    "Dropping completed session with non-positive amount"
                );
                METRICS.webhook_events_ignored_total.inc();
                return Ok(Json(serde_json::json!({ "received": true })));
            }

            let entry = normalize(&session);
            info!(
                payment_id = %entry.id,
                donor = %entry.name,
                total = %entry.total,
                "Donation confirmed"
            );

            // The processor retries forever on a non-2xx response, so a
            // failed write is logged and the delivery acknowledged anyway.
            match state.store.put_payment(&entry) {
                Ok(()) => {
                    METRICS.payments_recorded_total.inc();
                    METRICS
                        .payment_volume_dollars_total
                        .inc_by(entry.total.to_f64().unwrap_or(0.0));
                }
                Err(e) => {
                    METRICS.store_errors_total.inc();
                    error!(
                        payment_id = %entry.id,
                        error = %e,
                        "Failed to persist donation; acknowledging delivery anyway"
                    );
                }
            }
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

// Get one ledger entry by payment id
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentEntry>, GatewayError> {
    match state.store.get_payment(&id)? {
        Some(entry) => Ok(Json(entry)),
        None => Err(GatewayError::NotFound(format!("Payment not found: {}", id))),
    }
}

// Ranked leaderboard, recomputed from the full ledger on every request
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    METRICS.leaderboard_requests_total.inc();

    let timer = METRICS.leaderboard_compute_duration_seconds.start_timer();
    let payments = state.store.list_payments()?;
    let board = aggregate(&payments);
    timer.observe_duration();

    // Advisory cache write; the next recomputation overwrites it wholesale
    if let Err(e) = state.store.put_leaderboard_cache(&board) {
        warn!(error = %e, "Failed to refresh leaderboard cache");
    }

    // Donations land infrequently; let clients cache briefly
    Ok(([(header::CACHE_CONTROL, "public, max-age=30")], Json(board)))
}

// Entry counts per tier plus total ledger size
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, GatewayError> {
    let payments = state.store.list_payments()?;
    let board = aggregate(&payments);

    let mut tiers = TierCounts::default();
    for entry in &board {
        match entry.tier {
            Tier::Whale => tiers.whale += 1,
            Tier::Shark => tiers.shark += 1,
            Tier::Shrimp => tiers.shrimp += 1,
            Tier::Unknown => tiers.unknown += 1,
        }
    }

    Ok(Json(StatsResponse {
        total_entries: payments.len(),
        donors: board.len(),
        tiers,
    }))
}
