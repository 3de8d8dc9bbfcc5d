//! Error types for tariffsight-web
//!
//! One taxonomy for every failure the HTTP surface can report.
//! Entitlement denials resolve locally and are never retried;
//! classifier errors carry a retry affordance and never cost a credit.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session; the caller must sign in (401)
    #[error("Authentication required")]
    AuthRequired,

    /// Authenticated but lacking the required permission (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Subscription is cancelled; analysis blocked (403)
    #[error("Subscription is not active")]
    SubscriptionInactive,

    /// Credit balance is zero (402)
    #[error("No analysis credits remaining")]
    CreditsExhausted,

    /// Classifier network/timeout failure; retry allowed, no charge (502)
    #[error("Classification service unavailable: {0}")]
    ClassifierTransport(String),

    /// Classifier returned a structurally invalid result; no charge (502)
    #[error("Classification result invalid: {0}")]
    ClassifierValidation(String),

    /// Payment was declined or failed; caller stays on the payment step (402)
    #[error("Payment failed: {0}")]
    Payment(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., an analysis is already running for this session
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// tariffsight-common error (persistence and friends)
    #[error("Common error: {0}")]
    Common(#[from] tariffsight_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::AuthRequired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                self.to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::SubscriptionInactive => (
                StatusCode::FORBIDDEN,
                "SUBSCRIPTION_INACTIVE",
                self.to_string(),
            ),
            ApiError::CreditsExhausted => (
                StatusCode::PAYMENT_REQUIRED,
                "CREDITS_EXHAUSTED",
                self.to_string(),
            ),
            ApiError::ClassifierTransport(msg) => {
                (StatusCode::BAD_GATEWAY, "CLASSIFIER_UNAVAILABLE", msg)
            }
            ApiError::ClassifierValidation(msg) => {
                (StatusCode::BAD_GATEWAY, "CLASSIFIER_INVALID", msg)
            }
            ApiError::Payment(msg) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
