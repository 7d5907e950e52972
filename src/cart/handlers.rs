// HTTP handlers for cart endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::cart::{AddedCartItem, CartError, CartLineItem, CartSelection, ClearedCart};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartCount {
    pub count: usize,
}

/// Handler for GET /api/cart
#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Line items in the caller's cart", body = [CartLineItem]),
        (status = 401, description = "Missing or invalid identity token")
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn list_cart(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<CartLineItem>>, CartError> {
    let items = state.cart.list_items(&user.email).await?;
    Ok(Json(items))
}

/// Handler for POST /api/cart
#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = CartSelection,
    responses(
        (status = 201, description = "Line item added", body = AddedCartItem),
        (status = 400, description = "Invalid selection"),
        (status = 404, description = "Dish is not on the menu")
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn add_to_cart(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(selection): Json<CartSelection>,
) -> Result<(StatusCode, Json<AddedCartItem>), CartError> {
    let added = state.cart.add_item(&user.email, selection).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// Handler for GET /api/cart/count
#[utoipa::path(
    get,
    path = "/api/cart/count",
    responses((status = 200, description = "Displayed item count", body = CartCount)),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn cart_count(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<CartCount>, CartError> {
    let count = state.cart.cart_count(&user.email).await?;
    Ok(Json(CartCount { count }))
}

/// Handler for DELETE /api/cart/:id
#[utoipa::path(
    delete,
    path = "/api/cart/{id}",
    params(("id" = String, Path, description = "Cart line item id")),
    responses(
        (status = 204, description = "Line item removed"),
        (status = 404, description = "No such line item in the caller's cart")
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn remove_from_cart(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, CartError> {
    state.cart.remove_item(&user.email, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /api/cart
#[utoipa::path(
    delete,
    path = "/api/cart",
    responses((status = 200, description = "Cart cleared", body = ClearedCart)),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn clear_cart(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ClearedCart>, CartError> {
    let deleted = state.cart.clear_all(&user.email).await?;
    Ok(Json(ClearedCart { deleted }))
}
