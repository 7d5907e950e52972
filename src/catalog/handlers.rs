// HTTP handlers for catalog endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::catalog::{Category, MenuItem};
use crate::error::ApiError;

/// Handler for GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All menu categories", body = [Category]),
        (status = 429, description = "Content API still rate limited after retries"),
        (status = 502, description = "Content API unavailable")
    ),
    tag = "catalog"
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = state.catalog.categories().await?;
    Ok(Json(categories))
}

/// Handler for GET /api/categories/:slug/items
#[utoipa::path(
    get,
    path = "/api/categories/{slug}/items",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Menu items of the category", body = [MenuItem]),
        (status = 502, description = "Content API unavailable")
    ),
    tag = "catalog"
)]
pub async fn list_menu_items(
    State(state): State<crate::AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let items = state.catalog.menu_items(&slug).await?;
    Ok(Json(items))
}
