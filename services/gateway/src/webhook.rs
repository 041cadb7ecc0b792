// Webhook event model and payment normalization.
// Inbound events are a closed set: checkout completions are extracted with
// strict field validation, every other kind is acknowledged and ignored.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tipjar_ledger::PaymentEntry;
use uuid::Uuid;

/// Event kind the gateway acts on
const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Raw event envelope as delivered by the processor
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: serde_json::Value,
}

/// A completed checkout session, the only object the ledger cares about
#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,

    /// Gross amount in minor units (cents)
    pub amount_total: i64,

    /// Set at session-creation time: donor `name` and correlating `paymentId`
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Recognized webhook events
#[derive(Debug)]
pub enum WebhookEvent {
    CheckoutCompleted(CheckoutSession),
    /// Recognized-but-uninteresting kind; acknowledged, never an error
    Ignored(String),
}

impl WebhookEvent {
    /// Parse a signed-and-verified payload body
    pub fn parse(body: &str) -> Result<Self, String> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| format!("malformed event payload: {}", e))?;

        if envelope.event_type != EVENT_CHECKOUT_COMPLETED {
            return Ok(WebhookEvent::Ignored(envelope.event_type));
        }

        let session: CheckoutSession = serde_json::from_value(envelope.data.object)
            .map_err(|e| format!("malformed checkout session object: {}", e))?;

        Ok(WebhookEvent::CheckoutCompleted(session))
    }
}

/// Normalize a completed checkout session into a ledger entry.
///
/// Amount converts from minor units to two-decimal dollars. The ledger key
/// prefers the payment id planted in metadata at session creation; when that
/// is absent a fresh UUID is generated so the donation is still recorded.
/// The fallback key changes on every call, so a redelivered event without
/// metadata produces a second entry rather than an idempotent overwrite.
pub fn normalize(session: &CheckoutSession) -> PaymentEntry {
    let id = match session.metadata.get("paymentId") {
        Some(id) if !id.is_empty() => id.clone(),
        _ => Uuid::new_v4().to_string(),
    };

    let name = match session.metadata.get("name") {
        Some(name) if !name.trim().is_empty() => name.clone(),
        _ => "Anonymous".to_string(),
    };

    PaymentEntry::new(id, name, Decimal::new(session.amount_total, 2))
}
