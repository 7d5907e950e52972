use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::cart::{CartLineItem, NewCartItem};
use crate::content::{keys, queries, ContentGateway, GatewayError};

#[derive(Debug, Deserialize)]
struct CartRow {
    id: String,
    email: String,
    image: Option<String>,
    itemname: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
}

impl From<CartRow> for CartLineItem {
    fn from(row: CartRow) -> Self {
        CartLineItem {
            id: row.id,
            owner: row.email,
            item_name: row.itemname,
            unit_price: row.price,
            image_ref: row.image,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CartData {
    usercarts: Vec<CartRow>,
}

#[derive(Debug, Serialize)]
struct CartRowInput<'a> {
    email: &'a str,
    image: Option<&'a str>,
    itemname: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct RowId {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedCartRow {
    create_usercart: Option<RowId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletedCartRow {
    delete_usercart: Option<RowId>,
}

#[derive(Debug, Deserialize)]
struct Count {
    count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishedCartRows {
    publish_many_usercarts: Count,
}

/// Repository for cart rows in the content API
#[derive(Clone)]
pub struct CartRepository {
    gateway: ContentGateway,
}

impl CartRepository {
    pub fn new(gateway: ContentGateway) -> Self {
        Self { gateway }
    }

    /// Cart rows of `owner`, cached under `user-cart-<owner>`
    pub async fn find_by_owner(&self, owner: &str) -> Result<Vec<CartLineItem>, GatewayError> {
        let data: CartData = self
            .gateway
            .cached_query_as(
                &keys::cart(owner),
                queries::CART_BY_OWNER,
                json!({ "email": owner }),
            )
            .await?;
        Ok(data.usercarts.into_iter().map(CartLineItem::from).collect())
    }

    /// Cart rows of `owner`, bypassing whatever is cached
    pub async fn find_by_owner_fresh(&self, owner: &str) -> Result<Vec<CartLineItem>, GatewayError> {
        self.gateway.invalidate(&keys::cart(owner)).await;
        self.find_by_owner(owner).await
    }

    /// Create and publish a cart row, returning its id
    pub async fn create(&self, owner: &str, item: &NewCartItem) -> Result<String, GatewayError> {
        let input = CartRowInput {
            email: owner,
            image: item.image_ref.as_deref(),
            itemname: item.item_name.trim(),
            price: item.unit_price,
        };
        let created: CreatedCartRow = self
            .gateway
            .query_as(queries::CREATE_CART_ITEM, serde_json::to_value(&input)?)
            .await?;
        let id = created
            .create_usercart
            .map(|row| row.id)
            .ok_or_else(|| GatewayError::Decode("createUsercart returned no id".to_string()))?;

        self.gateway.pause_before_publish().await;
        if let Err(err) = self
            .gateway
            .execute(queries::PUBLISH_CART_ITEM, json!({ "id": id }))
            .await
        {
            warn!(id = %id, error = %err, "Failed to publish cart row");
        }

        self.gateway.invalidate(&keys::cart(owner)).await;
        info!(owner, id = %id, "Cart row created");
        Ok(id)
    }

    /// Delete one row without publishing or touching the cache.
    ///
    /// Returns false when the content API had no row with that id.
    pub async fn delete_row(&self, id: &str) -> Result<bool, GatewayError> {
        let deleted: DeletedCartRow = self
            .gateway
            .query_as(queries::DELETE_CART_ITEM, json!({ "id": id }))
            .await?;
        Ok(deleted.delete_usercart.is_some())
    }

    /// Delete one row, publish the deletion and drop every cached cart
    pub async fn delete(&self, id: &str) -> Result<bool, GatewayError> {
        let deleted = self.delete_row(id).await?;

        self.gateway.pause_before_publish().await;
        if let Err(err) = self.publish_many(&[id.to_string()]).await {
            warn!(id, error = %err, "Failed to publish cart deletion");
        }

        self.gateway.invalidate_prefix(keys::CART_PREFIX).await;
        Ok(deleted)
    }

    /// Publish a batch of rows in one mutation
    pub async fn publish_many(&self, ids: &[String]) -> Result<u64, GatewayError> {
        let published: PublishedCartRows = self
            .gateway
            .query_as(queries::PUBLISH_CART_ITEMS, json!({ "ids": ids }))
            .await?;
        Ok(published.publish_many_usercarts.count)
    }

    pub async fn invalidate_owner(&self, owner: &str) {
        self.gateway.invalidate(&keys::cart(owner)).await;
    }

    pub fn gateway(&self) -> &ContentGateway {
        &self.gateway
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::GatewaySettings;
    use crate::test_support::InMemoryContentApi;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const OWNER: &str = "diner@example.com";

    fn repository(api: &Arc<InMemoryContentApi>) -> CartRepository {
        CartRepository::new(ContentGateway::new(
            api.clone(),
            GatewaySettings::without_delays(),
        ))
    }

    fn biryani() -> NewCartItem {
        NewCartItem {
            item_name: "Chicken Biryani".to_string(),
            unit_price: dec!(250),
            image_ref: None,
        }
    }

    #[tokio::test]
    async fn test_create_publishes_and_invalidates() {
        let api = Arc::new(InMemoryContentApi::new());
        let repo = repository(&api);

        assert!(repo.find_by_owner(OWNER).await.unwrap().is_empty());
        let id = repo.create(OWNER, &biryani()).await.unwrap();

        let items = repo.find_by_owner(OWNER).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].unit_price, dec!(250));
        assert_eq!(api.call_count(queries::PUBLISH_CART_ITEM.name), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_is_not_fatal() {
        let api = Arc::new(InMemoryContentApi::new());
        api.fail_operation(queries::PUBLISH_CART_ITEM.name);
        let repo = repository(&api);

        assert!(repo.create(OWNER, &biryani()).await.is_ok());
        assert_eq!(repo.find_by_owner(OWNER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_invalidates_every_cart() {
        let api = Arc::new(InMemoryContentApi::new());
        let repo = repository(&api);
        let id = repo.create(OWNER, &biryani()).await.unwrap();
        repo.create("other@example.com", &biryani()).await.unwrap();

        repo.find_by_owner(OWNER).await.unwrap();
        repo.find_by_owner("other@example.com").await.unwrap();
        let reads = api.call_count(queries::CART_BY_OWNER.name);

        assert!(repo.delete(&id).await.unwrap());

        assert!(repo.find_by_owner(OWNER).await.unwrap().is_empty());
        repo.find_by_owner("other@example.com").await.unwrap();
        assert_eq!(api.call_count(queries::CART_BY_OWNER.name), reads + 2);
    }

    #[tokio::test]
    async fn test_delete_missing_row_reports_false() {
        let api = Arc::new(InMemoryContentApi::new());
        assert!(!repository(&api).delete_row("nope").await.unwrap());
    }
}
