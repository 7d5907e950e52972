// Cart Store
//
// All operations are scoped by owner email. Reads go through the gateway
// cache; every write leaves the owner's cache entry invalidated.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{info, warn};
use validator::Validate;

use crate::cart::{
    AddedCartItem, CartCounter, CartError, CartLineItem, CartRepository, CartSelection, NewCartItem,
};
use crate::catalog::CatalogRepository;

#[derive(Clone)]
pub struct CartStore {
    repo: CartRepository,
    catalog: CatalogRepository,
    counters: Arc<RwLock<HashMap<String, CartCounter>>>,
    delete_stagger: Duration,
}

impl CartStore {
    pub fn new(repo: CartRepository, catalog: CatalogRepository) -> Self {
        let delete_stagger = repo.gateway().settings().delete_stagger;
        Self {
            repo,
            catalog,
            counters: Arc::new(RwLock::new(HashMap::new())),
            delete_stagger,
        }
    }

    /// Add one unit of the selected dish for `owner`.
    ///
    /// Name, price and image come from the catalog, never from the caller.
    pub async fn add_item(
        &self,
        owner: &str,
        selection: CartSelection,
    ) -> Result<AddedCartItem, CartError> {
        selection.validate()?;

        let slug = selection.category_slug.trim();
        let id = selection.menu_item_id.trim();
        let dish = self
            .catalog
            .menu_item(slug, id)
            .await?
            .ok_or_else(|| CartError::UnknownMenuItem {
                category_slug: slug.to_string(),
                menu_item_id: id.to_string(),
            })?;

        self.add_line(owner, NewCartItem::from(&dish)).await
    }

    /// The displayed count is bumped before the remote create, then
    /// reconciled against a fresh fetch. A failed create rolls the bump back.
    async fn add_line(&self, owner: &str, item: NewCartItem) -> Result<AddedCartItem, CartError> {
        item.validate()?;

        self.update_counter(owner, CartCounter::increment).await;

        match self.repo.create(owner, &item).await {
            Ok(id) => {
                self.reconcile_counter(owner).await;
                Ok(AddedCartItem {
                    id,
                    count: self.cart_count(owner).await?,
                })
            }
            Err(err) => {
                warn!(owner, error = %err, "Cart add failed, rolling back counter");
                self.update_counter(owner, CartCounter::rollback).await;
                self.reconcile_counter(owner).await;
                Err(err.into())
            }
        }
    }

    /// Line items of `owner`, possibly served from cache
    pub async fn list_items(&self, owner: &str) -> Result<Vec<CartLineItem>, CartError> {
        Ok(self.repo.find_by_owner(owner).await?)
    }

    /// Line items of `owner` straight from the content API
    pub async fn refresh(&self, owner: &str) -> Result<Vec<CartLineItem>, CartError> {
        let items = self.repo.find_by_owner_fresh(owner).await?;
        self.update_counter(owner, |counter| counter.reconcile(items.len()))
            .await;
        Ok(items)
    }

    /// Remove one of `owner`'s line items
    pub async fn remove_item(&self, owner: &str, id: &str) -> Result<(), CartError> {
        let items = self.refresh(owner).await?;
        if !items.iter().any(|item| item.id == id) {
            return Err(CartError::NotFound(id.to_string()));
        }

        self.update_counter(owner, CartCounter::decrement).await;
        if let Err(err) = self.repo.delete(id).await {
            self.update_counter(owner, CartCounter::rollback).await;
            return Err(err.into());
        }

        self.reconcile_counter(owner).await;
        info!(owner, id, "Cart item removed");
        Ok(())
    }

    /// Delete every line item of `owner` and return how many were deleted.
    ///
    /// Deletes run concurrently, each delayed by its index times the
    /// stagger interval. Clearing an empty cart succeeds with zero.
    pub async fn clear_all(&self, owner: &str) -> Result<usize, CartError> {
        let items = self.repo.find_by_owner_fresh(owner).await?;
        if items.is_empty() {
            self.update_counter(owner, |counter| counter.reconcile(0)).await;
            return Ok(0);
        }

        info!(owner, count = items.len(), "Clearing cart");

        let stagger = self.delete_stagger;
        let deletions = items.iter().enumerate().map(|(index, item)| {
            let repo = &self.repo;
            async move {
                let offset = stagger.saturating_mul(index as u32);
                if !offset.is_zero() {
                    sleep(offset).await;
                }
                repo.delete_row(&item.id)
                    .await
                    .map(|_| item.id.clone())
            }
        });
        let results = join_all(deletions).await;

        let mut deleted = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(id) => deleted.push(id),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        if !deleted.is_empty() {
            self.repo.gateway().pause_before_publish().await;
            if let Err(err) = self.repo.publish_many(&deleted).await {
                warn!(owner, error = %err, "Failed to publish cleared cart rows");
            }
        }
        self.repo.invalidate_owner(owner).await;

        if let Some(err) = first_error {
            warn!(owner, deleted = deleted.len(), error = %err, "Cart clear incomplete");
            self.reconcile_counter(owner).await;
            return Err(err.into());
        }

        self.update_counter(owner, |counter| counter.reconcile(0)).await;
        info!(owner, deleted = deleted.len(), "Cart cleared");
        Ok(deleted.len())
    }

    /// Count to display for `owner`, including optimistic changes
    pub async fn cart_count(&self, owner: &str) -> Result<usize, CartError> {
        if let Some(counter) = self.counters.read().await.get(owner) {
            return Ok(counter.displayed());
        }

        let items = self.list_items(owner).await?;
        self.update_counter(owner, |counter| counter.reconcile(items.len()))
            .await;
        Ok(items.len())
    }

    async fn update_counter<F>(&self, owner: &str, apply: F)
    where
        F: FnOnce(&mut CartCounter),
    {
        let mut counters = self.counters.write().await;
        apply(counters.entry(owner.to_string()).or_default());
    }

    /// Replace the counter with a fresh remote count; keep it on failure
    async fn reconcile_counter(&self, owner: &str) {
        match self.repo.find_by_owner_fresh(owner).await {
            Ok(items) => {
                self.update_counter(owner, |counter| counter.reconcile(items.len()))
                    .await
            }
            Err(err) => warn!(owner, error = %err, "Could not reconcile cart count"),
        }
    }
}
