// Payment processor client.
// Two concerns: creating hosted checkout sessions (REST, bearer auth) and
// verifying webhook signatures (HMAC-SHA256 over "{timestamp}.{payload}",
// Stripe-Signature header format "t=<ts>,v1=<hex>").

use anyhow::{anyhow, Context, Result};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Signatures older than this are rejected even when the MAC checks out
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub struct ProcessorClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    webhook_secret: String,
}

#[derive(Debug, Deserialize)]
struct SessionCreated {
    id: String,
}

impl ProcessorClient {
    pub fn new(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Create a hosted checkout session for one donation.
    ///
    /// `metadata` carries the donor name and the pre-assigned payment id so
    /// the completion webhook can be correlated back to a ledger key.
    pub async fn create_checkout_session(
        &self,
        name: &str,
        payment_id: &str,
        amount_minor: u64,
        currency: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String> {
        let params: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
            ("line_items[0][price_data][currency]", currency.to_string()),
            (
                "line_items[0][price_data][unit_amount]",
                amount_minor.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                "Donation".to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[name]", name.to_string()),
            ("metadata[paymentId]", payment_id.to_string()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .context("checkout session request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "processor returned {} creating checkout session: {}",
                status,
                body
            ));
        }

        let created: SessionCreated = response
            .json()
            .await
            .context("malformed checkout session response")?;

        debug!(session_id = %created.id, payment_id, "Checkout session created");
        Ok(created.id)
    }

    /// Verify a webhook payload against its signature header.
    ///
    /// Returns `Ok(false)` for a well-formed header that does not verify;
    /// `Err` only when the header itself cannot be parsed.
    pub fn verify_webhook_signature(&self, payload: &[u8], header: &str) -> Result<bool> {
        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<Vec<u8>> = Vec::new();

        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = Some(value.parse().context("non-numeric signature timestamp")?);
                }
                Some(("v1", value)) => {
                    candidates.push(hex::decode(value).context("non-hex signature")?);
                }
                _ => {} // Unknown scheme versions are skipped, not errors
            }
        }

        let timestamp = timestamp.ok_or_else(|| anyhow!("signature header missing timestamp"))?;
        if candidates.is_empty() {
            return Err(anyhow!("signature header missing v1 signature"));
        }

        let age = chrono::Utc::now().timestamp() - timestamp;
        if age.abs() > SIGNATURE_TOLERANCE_SECS {
            warn!(age_secs = age, "Rejecting webhook signature outside tolerance");
            return Ok(false);
        }

        let mut signed_payload = timestamp.to_string().into_bytes();
        signed_payload.push(b'.');
        signed_payload.extend_from_slice(payload);

        let verified = candidates.iter().any(|candidate| {
            let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
                .expect("HMAC accepts any key length");
            mac.update(&signed_payload);
            // verify_slice is constant-time
            mac.verify_slice(candidate).is_ok()
        });

        Ok(verified)
    }
}
