// Error types for the content API boundary

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorResponse;

/// Failure of a single GraphQL round trip, before any retry decision
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The content API throttled the request (HTTP 429)
    #[error("rate limited by content API")]
    RateLimited,

    /// Non-success HTTP status other than 429
    #[error("content API responded with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS or timeout failure
    #[error("network error: {0}")]
    Network(String),

    /// The response carried a GraphQL `errors` array
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    /// The response body was not the expected JSON shape
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

/// Categorised content gateway failure surfaced to callers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Still throttled after every retry
    #[error("content API rate limit persisted after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Any other remote failure; not retried
    #[error("content API unavailable: {0}")]
    Unavailable(String),

    /// Data returned by the content API could not be mapped
    #[error("unexpected content API data: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Classify the final transport error of a call chain
    pub fn from_transport(err: TransportError, attempts: u32) -> Self {
        match err {
            TransportError::RateLimited => GatewayError::RateLimited { attempts },
            TransportError::Decode(msg) => GatewayError::Decode(msg),
            other => GatewayError::Unavailable(other.to_string()),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::RateLimited { .. } => "rate_limited",
            GatewayError::Unavailable(_) | GatewayError::Decode(_) => "remote_unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Unavailable(_) | GatewayError::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show an end user
    pub fn user_message(&self) -> &'static str {
        match self {
            GatewayError::RateLimited { .. } => {
                "The service is busy right now, please try again in a moment"
            }
            GatewayError::Unavailable(_) | GatewayError::Decode(_) => {
                "Something went wrong, please try again"
            }
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::error!("Content gateway error: {}", self);
        let body = ErrorResponse::new(self.error_code(), self.user_message());
        (self.status_code(), Json(body)).into_response()
    }
}
