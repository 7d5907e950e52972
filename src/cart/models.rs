use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::catalog::MenuItem;

/// One unit of one dish in a user's cart
///
/// There is no quantity field; adding the same dish twice creates two rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLineItem {
    pub id: String,
    pub owner: String,
    #[schema(example = "Chicken Biryani")]
    pub item_name: String,
    #[schema(value_type = String, example = "250")]
    pub unit_price: Decimal,
    pub image_ref: Option<String>,
}

/// Request body for POST /api/cart
///
/// Names a dish on the menu; name and price are read from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CartSelection {
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "biryani")]
    pub category_slug: String,

    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "dish-1")]
    pub menu_item_id: String,
}

/// Cart row about to be written, priced from the catalog
#[derive(Debug, Clone, Validate)]
pub struct NewCartItem {
    #[validate(custom = "crate::validation::validate_not_blank")]
    pub item_name: String,

    #[validate(custom = "crate::validation::validate_non_negative_price")]
    pub unit_price: Decimal,

    #[validate(url)]
    pub image_ref: Option<String>,
}

impl From<&MenuItem> for NewCartItem {
    fn from(dish: &MenuItem) -> Self {
        NewCartItem {
            item_name: dish.name.clone(),
            unit_price: dish.price,
            image_ref: dish.image_url.clone(),
        }
    }
}

/// Response for POST /api/cart
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddedCartItem {
    pub id: String,
    /// Item count to display after the add
    pub count: usize,
}

/// Response for DELETE /api/cart
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearedCart {
    pub deleted: usize,
}
