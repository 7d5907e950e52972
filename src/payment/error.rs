use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::error::ErrorResponse;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentError {
    /// Key id or secret not configured; nothing was sent
    #[error("payment gateway credentials are not configured")]
    CredentialsMissing,

    /// Amount was not a positive number of subunits; nothing was sent
    #[error("amount must be a positive number of currency subunits, got {0}")]
    InvalidAmount(i64),

    /// The gateway answered with an error body
    #[error("payment gateway error {code}: {description}")]
    Gateway { code: String, description: String },

    /// Connection failure or unreadable response
    #[error("payment gateway unreachable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::Unavailable(err.to_string())
    }
}

impl PaymentError {
    pub fn error_code(&self) -> &'static str {
        match self {
            PaymentError::CredentialsMissing => "credentials_missing",
            PaymentError::InvalidAmount(_) => "invalid_amount",
            PaymentError::Gateway { .. } | PaymentError::Unavailable(_) => "remote_unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::CredentialsMissing => StatusCode::INTERNAL_SERVER_ERROR,
            PaymentError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            PaymentError::Gateway { .. } | PaymentError::Unavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            PaymentError::CredentialsMissing => "Payments are not available right now".to_string(),
            PaymentError::InvalidAmount(_) => self.to_string(),
            PaymentError::Gateway { .. } | PaymentError::Unavailable(_) => {
                "Could not reach the payment provider, please try again".to_string()
            }
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        match &self {
            PaymentError::InvalidAmount(amount) => warn!(amount, "Rejected payment amount"),
            other => error!("Payment gateway error: {}", other),
        }
        let body = ErrorResponse::new(self.error_code(), self.user_message());
        (self.status_code(), Json(body)).into_response()
    }
}
