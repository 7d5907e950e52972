use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::content::GatewayError;
use crate::error::{field_errors, ErrorResponse};

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("invalid cart item")]
    Validation(validator::ValidationErrors),

    #[error("cart item {0} not found")]
    NotFound(String),

    #[error("menu item {menu_item_id} not found in {category_slug}")]
    UnknownMenuItem {
        category_slug: String,
        menu_item_id: String,
    },
}

impl From<validator::ValidationErrors> for CartError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CartError::Validation(errors)
    }
}

impl IntoResponse for CartError {
    fn into_response(self) -> Response {
        match self {
            CartError::Gateway(err) => err.into_response(),
            CartError::Validation(errors) => {
                tracing::debug!("Cart validation error: {:?}", errors);
                let body = ErrorResponse::new("validation_error", "Invalid cart item")
                    .with_details(field_errors(&errors));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            CartError::NotFound(id) => {
                let body = ErrorResponse::new("not_found", format!("Cart item {} not found", id));
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            CartError::UnknownMenuItem {
                category_slug,
                menu_item_id,
            } => {
                let body = ErrorResponse::new(
                    "menu_item_not_found",
                    format!("No dish {} in category {}", menu_item_id, category_slug),
                );
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
        }
    }
}
