// Error handling for the gateway HTTP surface.
// Every handler error is converted to a JSON response here; nothing
// propagates far enough to crash the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

#[derive(Debug)]
pub enum GatewayError {
    /// Missing or invalid request fields (400)
    Validation(String),
    /// Webhook signature did not verify (400)
    SignatureRejected(String),
    /// Bot verification failed (403)
    Forbidden(String),
    /// Unknown payment id (404)
    NotFound(String),
    /// Payment processor or verification service failure (500)
    Upstream(String),
    /// Anything else, including ledger store errors on read paths (500)
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GatewayError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            GatewayError::SignatureRejected(msg) => {
                (StatusCode::BAD_REQUEST, format!("Webhook error: {}", msg))
            }
            GatewayError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            GatewayError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            GatewayError::Upstream(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Upstream error: {}", msg))
            }
            GatewayError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", msg))
            }
        };

        (
            status,
            Json(serde_json::json!({
                "error": message,
                "timestamp": Utc::now(),
            })),
        )
            .into_response()
    }
}

impl From<tipjar_ledger::Error> for GatewayError {
    fn from(err: tipjar_ledger::Error) -> Self {
        GatewayError::Internal(err.to_string())
    }
}
