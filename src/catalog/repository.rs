use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::catalog::{Category, MenuItem};
use crate::content::{keys, queries, ContentGateway, GatewayError};

#[derive(Debug, Deserialize)]
struct Asset {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    icon: Option<Asset>,
}

#[derive(Debug, Deserialize)]
struct MenuItemRow {
    id: String,
    name: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    description: Option<String>,
    img: Option<Asset>,
}

#[derive(Debug, Deserialize)]
struct CategoriesData {
    categories: Vec<CategoryRow>,
}

#[derive(Debug, Deserialize)]
struct MenuItemsData {
    menuitems: Vec<MenuItemRow>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            icon_url: row.icon.map(|asset| asset.url),
        }
    }
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            name: row.name,
            price: row.price,
            description: row.description,
            image_url: row.img.map(|asset| asset.url),
        }
    }
}

/// Repository for catalog reads
#[derive(Clone)]
pub struct CatalogRepository {
    gateway: ContentGateway,
}

impl CatalogRepository {
    pub fn new(gateway: ContentGateway) -> Self {
        Self { gateway }
    }

    /// All categories, cached under `categories`
    pub async fn categories(&self) -> Result<Vec<Category>, GatewayError> {
        let data: CategoriesData = self
            .gateway
            .cached_query_as(keys::CATEGORIES, queries::CATEGORIES, json!({}))
            .await?;
        Ok(data.categories.into_iter().map(Category::from).collect())
    }

    /// Menu items of one category, cached under `menu-items-<slug>`
    pub async fn menu_items(&self, slug: &str) -> Result<Vec<MenuItem>, GatewayError> {
        let data: MenuItemsData = self
            .gateway
            .cached_query_as(
                &keys::menu_items(slug),
                queries::MENU_ITEMS_BY_CATEGORY,
                json!({ "slug": slug }),
            )
            .await?;
        Ok(data.menuitems.into_iter().map(MenuItem::from).collect())
    }

    /// One dish of a category, if it is on the menu
    pub async fn menu_item(&self, slug: &str, id: &str) -> Result<Option<MenuItem>, GatewayError> {
        let items = self.menu_items(slug).await?;
        Ok(items.into_iter().find(|item| item.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::GatewaySettings;
    use crate::test_support::InMemoryContentApi;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn repository(api: &Arc<InMemoryContentApi>) -> CatalogRepository {
        CatalogRepository::new(ContentGateway::new(
            api.clone(),
            GatewaySettings::without_delays(),
        ))
    }

    #[tokio::test]
    async fn test_categories_map_icon_url() {
        let api = Arc::new(InMemoryContentApi::seeded());
        let categories = repository(&api).categories().await.unwrap();

        let biryani = categories.iter().find(|c| c.slug == "biryani").unwrap();
        assert_eq!(biryani.name, "Biryani");
        assert!(biryani.icon_url.as_deref().unwrap().starts_with("https://"));
    }

    #[tokio::test]
    async fn test_menu_items_filtered_by_slug_and_cached() {
        let api = Arc::new(InMemoryContentApi::seeded());
        let repo = repository(&api);

        let items = repo.menu_items("beverages").await.unwrap();
        assert!(items.iter().any(|item| item.name == "Lassi" && item.price == dec!(50)));
        assert!(items.iter().all(|item| item.name != "Chicken Biryani"));

        repo.menu_items("beverages").await.unwrap();
        assert_eq!(api.call_count(queries::MENU_ITEMS_BY_CATEGORY.name), 1);

        repo.menu_items("biryani").await.unwrap();
        assert_eq!(api.call_count(queries::MENU_ITEMS_BY_CATEGORY.name), 2);
    }

    #[tokio::test]
    async fn test_menu_item_lookup() {
        let api = Arc::new(InMemoryContentApi::seeded());
        let repo = repository(&api);

        let lassi = repo.menu_item("beverages", "dish-2").await.unwrap().unwrap();
        assert_eq!(lassi.name, "Lassi");
        assert_eq!(lassi.price, dec!(50));
        assert!(repo.menu_item("biryani", "dish-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_slug_is_empty() {
        let api = Arc::new(InMemoryContentApi::seeded());
        let items = repository(&api).menu_items("desserts").await.unwrap();
        assert!(items.is_empty());
    }
}
