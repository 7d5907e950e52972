// HTTP handlers for checkout and order history

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::orders::{CheckoutError, CheckoutRequest, CheckoutResponse, Order, PaymentReport};

/// Handler for POST /api/checkout
///
/// Cash on delivery answers with `confirmed`; gateway payments answer with
/// `awaiting_payment` and the payment order to open the widget with.
#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order confirmed or awaiting payment", body = CheckoutResponse),
        (status = 400, description = "Invalid address or empty cart"),
        (status = 409, description = "The same cart is already being checked out"),
        (status = 422, description = "Coupon rejected"),
        (status = 500, description = "Order could not be saved; cart kept")
    ),
    security(("bearer" = [])),
    tag = "checkout"
)]
pub async fn start_checkout(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, CheckoutError> {
    let response = state.checkout.start(&user, request).await?;
    Ok(Json(response))
}

/// Handler for POST /api/checkout/:attempt_id/complete
#[utoipa::path(
    post,
    path = "/api/checkout/{attempt_id}/complete",
    params(("attempt_id" = Uuid, Path, description = "Checkout attempt id")),
    request_body = PaymentReport,
    responses(
        (status = 200, description = "Payment verified and order confirmed", body = CheckoutResponse),
        (status = 402, description = "Payment unverified or past its deadline"),
        (status = 404, description = "No pending attempt with this id")
    ),
    security(("bearer" = [])),
    tag = "checkout"
)]
pub async fn complete_checkout_payment(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(attempt_id): Path<Uuid>,
    Json(report): Json<PaymentReport>,
) -> Result<Json<CheckoutResponse>, CheckoutError> {
    let response = state
        .checkout
        .complete_payment(&user, attempt_id, report)
        .await?;
    Ok(Json(response))
}

/// Handler for POST /api/checkout/:attempt_id/cancel
#[utoipa::path(
    post,
    path = "/api/checkout/{attempt_id}/cancel",
    params(("attempt_id" = Uuid, Path, description = "Checkout attempt id")),
    responses(
        (status = 402, description = "Attempt closed as payment_cancelled"),
        (status = 404, description = "No pending attempt with this id")
    ),
    security(("bearer" = [])),
    tag = "checkout"
)]
pub async fn cancel_checkout_payment(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(attempt_id): Path<Uuid>,
) -> Result<Json<CheckoutResponse>, CheckoutError> {
    let response = state.checkout.cancel_payment(&user, attempt_id).await?;
    Ok(Json(response))
}

/// Handler for GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = [Order]),
        (status = 401, description = "Missing or invalid identity token")
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Order>>, CheckoutError> {
    let orders = state.orders.find_by_owner(&user.email).await?;
    Ok(Json(orders))
}
