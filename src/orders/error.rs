use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::cart::CartError;
use crate::content::GatewayError;
use crate::error::{field_errors, ErrorResponse};
use crate::payment::PaymentError;
use crate::pricing::CouponRejection;

/// Error types for checkout and order history
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Address or cart failed validation; nothing was priced or saved
    #[error("checkout validation failed")]
    Validation(validator::ValidationErrors),

    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Creating the remote payment order failed
    #[error(transparent)]
    PaymentSetup(#[from] PaymentError),

    #[error("payment was cancelled")]
    PaymentCancelled,

    #[error("payment could not be verified")]
    PaymentUnverified,

    /// The order row could not be created; the cart is left untouched
    #[error("order could not be saved: {0}")]
    OrderSaveFailed(GatewayError),

    #[error("a checkout for this cart is already in progress")]
    DuplicateSubmission,

    #[error("checkout attempt {0} not found")]
    AttemptNotFound(Uuid),

    /// The payment went through; only the order save is outstanding
    #[error("payment for checkout attempt {0} was already captured")]
    PaymentCaptured(Uuid),

    #[error("invalid checkout state: {0}")]
    InvalidTransition(String),
}

impl From<validator::ValidationErrors> for CheckoutError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CheckoutError::Validation(errors)
    }
}

impl From<CartError> for CheckoutError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Gateway(err) => CheckoutError::Gateway(err),
            CartError::Validation(errors) => CheckoutError::Validation(errors),
            CartError::NotFound(id) => {
                CheckoutError::Gateway(GatewayError::Decode(format!("cart item {} vanished", id)))
            }
            err @ CartError::UnknownMenuItem { .. } => {
                CheckoutError::Gateway(GatewayError::Decode(err.to_string()))
            }
        }
    }
}

impl CheckoutError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "validation_error",
            CheckoutError::Coupon(rejection) => rejection.reason(),
            CheckoutError::Gateway(err) => err.error_code(),
            CheckoutError::PaymentSetup(err) => err.error_code(),
            CheckoutError::PaymentCancelled => "payment_cancelled",
            CheckoutError::PaymentUnverified => "payment_unverified",
            CheckoutError::OrderSaveFailed(_) => "order_save_failed",
            CheckoutError::DuplicateSubmission => "duplicate_submission",
            CheckoutError::AttemptNotFound(_) => "not_found",
            CheckoutError::PaymentCaptured(_) => "payment_captured",
            CheckoutError::InvalidTransition(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckoutError::Coupon(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutError::Gateway(err) => err.status_code(),
            CheckoutError::PaymentSetup(err) => err.status_code(),
            CheckoutError::PaymentCancelled | CheckoutError::PaymentUnverified => {
                StatusCode::PAYMENT_REQUIRED
            }
            CheckoutError::OrderSaveFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CheckoutError::DuplicateSubmission | CheckoutError::PaymentCaptured(_) => {
                StatusCode::CONFLICT
            }
            CheckoutError::AttemptNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::InvalidTransition(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            CheckoutError::Validation(_) => "Please correct the highlighted fields".to_string(),
            CheckoutError::Coupon(rejection) => rejection.to_string(),
            CheckoutError::Gateway(err) => err.user_message().to_string(),
            CheckoutError::PaymentSetup(err) => err.user_message(),
            CheckoutError::PaymentCancelled => "Payment was cancelled".to_string(),
            CheckoutError::PaymentUnverified => {
                "We could not verify your payment. Please contact support if you were charged"
                    .to_string()
            }
            CheckoutError::OrderSaveFailed(_) => {
                "Your order could not be saved. Your cart has been kept, please try again"
                    .to_string()
            }
            CheckoutError::DuplicateSubmission => {
                "This order is already being placed".to_string()
            }
            CheckoutError::AttemptNotFound(_) => "Checkout attempt not found".to_string(),
            CheckoutError::PaymentCaptured(_) => {
                "Your payment was received. Please retry placing the order".to_string()
            }
            CheckoutError::InvalidTransition(_) => "Something went wrong, please try again".to_string(),
        }
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let mut body = ErrorResponse::new(self.error_code(), self.user_message());

        match &self {
            CheckoutError::Validation(errors) => {
                debug!("Checkout validation error: {:?}", errors);
                body = body.with_details(field_errors(errors));
            }
            CheckoutError::OrderSaveFailed(err) => error!("Order save failed: {}", err),
            CheckoutError::Gateway(err) => error!("Content gateway error: {}", err),
            CheckoutError::PaymentSetup(err) => error!("Payment setup failed: {}", err),
            CheckoutError::InvalidTransition(msg) => error!("Checkout state error: {}", msg),
            other => warn!("Checkout rejected: {}", other),
        }

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_codes_and_statuses() {
        let cases = [
            (CheckoutError::PaymentCancelled, "payment_cancelled", 402),
            (CheckoutError::PaymentUnverified, "payment_unverified", 402),
            (
                CheckoutError::OrderSaveFailed(GatewayError::Unavailable("down".to_string())),
                "order_save_failed",
                500,
            ),
            (CheckoutError::DuplicateSubmission, "duplicate_submission", 409),
            (CheckoutError::AttemptNotFound(Uuid::nil()), "not_found", 404),
            (CheckoutError::PaymentCaptured(Uuid::nil()), "payment_captured", 409),
            (
                CheckoutError::PaymentSetup(PaymentError::CredentialsMissing),
                "credentials_missing",
                500,
            ),
            (
                CheckoutError::Gateway(GatewayError::RateLimited { attempts: 3 }),
                "rate_limited",
                429,
            ),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.error_code(), code);
            assert_eq!(err.status_code().as_u16(), status);
        }
    }

    #[test]
    fn test_coupon_rejection_uses_reason_code() {
        let err = CheckoutError::from(CouponRejection::NotFound("NOPE".to_string()));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), CouponRejection::NotFound("NOPE".to_string()).reason());
    }
}
