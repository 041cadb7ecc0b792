// Gateway configuration, loaded from environment variables.
// Processor secrets are required; everything else has a sane default.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: String,

    /// Payment processor REST base URL (overridable for tests)
    pub processor_api_base: String,
    pub processor_secret_key: String,
    pub processor_webhook_secret: String,

    /// Bot verification; disabled entirely when no secret is configured
    pub recaptcha_secret: Option<String>,
    pub recaptcha_verify_url: String,
    pub recaptcha_min_score: f64,

    /// Where the processor redirects after checkout
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    pub currency: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let processor_secret_key = std::env::var("PROCESSOR_SECRET_KEY")
            .context("PROCESSOR_SECRET_KEY must be set")?;
        let processor_webhook_secret = std::env::var("PROCESSOR_WEBHOOK_SECRET")
            .context("PROCESSOR_WEBHOOK_SECRET must be set")?;

        let recaptcha_min_score = match std::env::var("RECAPTCHA_MIN_SCORE") {
            Ok(v) => v
                .parse::<f64>()
                .context("RECAPTCHA_MIN_SCORE must be a number")?,
            Err(_) => 0.5,
        };

        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
            processor_api_base: env_or("PROCESSOR_API_BASE", "https://api.stripe.com"),
            processor_secret_key,
            processor_webhook_secret,
            recaptcha_secret: std::env::var("RECAPTCHA_SECRET").ok(),
            recaptcha_verify_url: env_or(
                "RECAPTCHA_VERIFY_URL",
                "https://www.google.com/recaptcha/api/siteverify",
            ),
            recaptcha_min_score,
            checkout_success_url: env_or(
                "CHECKOUT_SUCCESS_URL",
                "http://localhost:5173/thanks",
            ),
            checkout_cancel_url: env_or("CHECKOUT_CANCEL_URL", "http://localhost:5173/"),
            currency: env_or("CHECKOUT_CURRENCY", "usd"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
