// Error handling module for the storefront API
// Provides the shared JSON error body and the error type used by the
// catalog and quote handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::cart::CartError;
use crate::content::GatewayError;
use crate::pricing::CouponRejection;

/// Consistent error response structure
///
/// Every error produced by the API, whatever its domain, is rendered in
/// this shape so the storefront UI can branch on `error_code`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "validation_error", "rate_limited")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (e.g. field-level validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Flatten validator output into `{field: [code, ...]}`
///
/// Nested structs (e.g. the delivery address inside a checkout request)
/// are reported with their own field names, not the parent's.
pub fn field_errors(errors: &validator::ValidationErrors) -> Value {
    let mut map = Map::new();
    collect_field_errors(errors, &mut map);
    Value::Object(map)
}

fn collect_field_errors(errors: &validator::ValidationErrors, map: &mut Map<String, Value>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                let codes: Vec<Value> = list.iter().map(|e| json!(e.code)).collect();
                map.insert(field.to_string(), Value::Array(codes));
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(nested, map),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_field_errors(nested, map);
                }
            }
        }
    }
}

/// Error type for handlers outside the cart, checkout and payment flows
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Maps to HTTP 400 Bad Request
    #[error("validation failed")]
    Validation(validator::ValidationErrors),

    /// Maps to HTTP 404 Not Found
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    /// Maps to HTTP 422 Unprocessable Entity
    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    /// Status decided by the gateway classification (429 / 502)
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<CartError> for ApiError {
    fn from(error: CartError) -> Self {
        match error {
            CartError::Gateway(err) => ApiError::Gateway(err),
            CartError::Validation(errors) => ApiError::Validation(errors),
            CartError::NotFound(id) => ApiError::NotFound {
                resource: "Cart item".to_string(),
                id,
            },
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Coupon(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Gateway(err) => err.status_code(),
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        match self {
            ApiError::Validation(errors) => {
                debug!("Validation error: {:?}", errors);
                ErrorResponse::new("validation_error", "Request validation failed")
                    .with_details(field_errors(errors))
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                ErrorResponse::new("not_found", format!("{} with id {} not found", resource, id))
            }
            ApiError::Coupon(rejection) => {
                warn!("Coupon rejected: {}", rejection);
                ErrorResponse::new(rejection.reason(), rejection.to_string())
            }
            ApiError::Gateway(err) => {
                error!("Content gateway error: {}", err);
                ErrorResponse::new(err.error_code(), err.user_message())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.to_error_response();
        (self.status_code(), Json(body)).into_response()
    }
}
