use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A menu category, e.g. "Biryani" or "Beverages"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: String,
    #[schema(example = "Biryani")]
    pub name: String,
    #[schema(example = "biryani")]
    pub slug: String,
    pub icon_url: Option<String>,
}

/// A dish that can be added to the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub id: String,
    #[schema(example = "Chicken Biryani")]
    pub name: String,
    #[schema(value_type = String, example = "250")]
    pub price: Decimal,
    pub description: Option<String>,
    pub image_url: Option<String>,
}
