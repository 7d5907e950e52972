// HTTP handler for pricing quotes

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::pricing::{PricingBreakdown, PricingEngine};

/// Request body for POST /api/cart/quote
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct QuoteRequest {
    #[schema(example = "WELCOME15")]
    pub coupon_code: Option<String>,
}

/// Handler for POST /api/cart/quote
/// Prices the caller's live cart without placing an order
#[utoipa::path(
    post,
    path = "/api/cart/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Pricing breakdown", body = PricingBreakdown),
        (status = 422, description = "Coupon not found or below its minimum subtotal")
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn quote_cart(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<PricingBreakdown>, ApiError> {
    let items = state.cart.list_items(&user.email).await?;
    let subtotal = PricingEngine::calculate_subtotal(&items);

    let coupon = match request
        .coupon_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        Some(code) => Some(state.coupons.resolve(code, subtotal)?),
        None => None,
    };

    Ok(Json(PricingEngine::compute_pricing(&items, coupon.as_ref())))
}
