// In-memory stand-in for the GraphQL content API
//
// Answers the operations in `content::queries` with the same data shapes
// the hosted API returns, and lets tests inject rate limiting or hard
// failures per operation.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::content::{queries, GraphqlRequest, GraphqlTransport, TransportError};

#[derive(Default)]
struct Store {
    categories: Vec<Value>,
    /// (category slug, menu item)
    menu_items: Vec<(String, Value)>,
    cart_rows: Vec<Value>,
    orders: Vec<Value>,
    calls: HashMap<String, usize>,
    rate_limited: HashMap<String, usize>,
    failing: HashSet<String>,
    next_id: u64,
}

impl Store {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

#[derive(Default)]
pub struct InMemoryContentApi {
    store: Mutex<Store>,
}

impl InMemoryContentApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with two categories and a few dishes
    pub fn seeded() -> Self {
        let api = Self::new();
        {
            let mut store = api.lock();
            store.categories = vec![
                json!({
                    "id": "cat-1",
                    "name": "Biryani",
                    "slug": "biryani",
                    "icon": { "url": "https://cdn.example.com/icons/biryani.png" }
                }),
                json!({
                    "id": "cat-2",
                    "name": "Beverages",
                    "slug": "beverages",
                    "icon": null
                }),
            ];
            store.menu_items = vec![
                (
                    "biryani".to_string(),
                    json!({
                        "id": "dish-1",
                        "name": "Chicken Biryani",
                        "price": 250.0,
                        "description": "Dum cooked with basmati rice",
                        "img": { "url": "https://cdn.example.com/dishes/chicken-biryani.jpg" }
                    }),
                ),
                (
                    "beverages".to_string(),
                    json!({
                        "id": "dish-2",
                        "name": "Lassi",
                        "price": 50.0,
                        "description": null,
                        "img": null
                    }),
                ),
                (
                    "beverages".to_string(),
                    json!({
                        "id": "dish-3",
                        "name": "Masala Chai",
                        "price": 30.0,
                        "description": "Spiced milk tea",
                        "img": null
                    }),
                ),
            ];
        }
        api
    }

    /// How many times `operation` was called, throttled calls included
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Answer the next `times` calls of `operation` with HTTP 429
    pub fn rate_limit(&self, operation: &str, times: usize) {
        self.lock().rate_limited.insert(operation.to_string(), times);
    }

    /// Answer every call of `operation` with HTTP 500
    pub fn fail_operation(&self, operation: &str) {
        self.lock().failing.insert(operation.to_string());
    }

    pub fn restore_operation(&self, operation: &str) {
        self.lock().failing.remove(operation);
    }

    /// Add a cart row directly, bypassing the gateway and its cache
    pub fn insert_cart_row(&self, owner: &str, item_name: &str, price: Decimal) -> String {
        let mut store = self.lock();
        let id = store.next_id("cart");
        store.cart_rows.push(json!({
            "id": id,
            "email": owner,
            "image": null,
            "itemname": item_name,
            "price": price.to_f64().unwrap_or_default(),
        }));
        id
    }

    pub fn cart_len(&self, owner: &str) -> usize {
        self.lock()
            .cart_rows
            .iter()
            .filter(|row| row["email"] == owner)
            .count()
    }

    pub fn order_rows(&self) -> Vec<Value> {
        self.lock().orders.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl GraphqlTransport for InMemoryContentApi {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, TransportError> {
        let mut store = self.lock();
        let name = request.operation_name;
        let vars = &request.variables;

        *store.calls.entry(name.to_string()).or_default() += 1;

        if let Some(remaining) = store.rate_limited.get_mut(name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::RateLimited);
            }
        }
        if store.failing.contains(name) {
            return Err(TransportError::Status {
                status: 500,
                body: format!("{} failed", name),
            });
        }

        let data = match name {
            n if n == queries::CATEGORIES.name => json!({ "categories": store.categories }),
            n if n == queries::MENU_ITEMS_BY_CATEGORY.name => {
                let items: Vec<&Value> = store
                    .menu_items
                    .iter()
                    .filter(|(slug, _)| vars["slug"] == slug.as_str())
                    .map(|(_, item)| item)
                    .collect();
                json!({ "menuitems": items })
            }
            n if n == queries::CREATE_CART_ITEM.name => {
                let id = store.next_id("cart");
                store.cart_rows.push(json!({
                    "id": id,
                    "email": vars["email"],
                    "image": vars["image"],
                    "itemname": vars["itemname"],
                    "price": vars["price"],
                }));
                json!({ "createUsercart": { "id": id } })
            }
            n if n == queries::PUBLISH_CART_ITEM.name => {
                json!({ "publishUsercart": { "id": vars["id"] } })
            }
            n if n == queries::CART_BY_OWNER.name => {
                let rows: Vec<&Value> = store
                    .cart_rows
                    .iter()
                    .filter(|row| row["email"] == vars["email"])
                    .collect();
                json!({ "usercarts": rows })
            }
            n if n == queries::DELETE_CART_ITEM.name => {
                let before = store.cart_rows.len();
                store.cart_rows.retain(|row| row["id"] != vars["id"]);
                if store.cart_rows.len() < before {
                    json!({ "deleteUsercart": { "id": vars["id"] } })
                } else {
                    json!({ "deleteUsercart": null })
                }
            }
            n if n == queries::PUBLISH_CART_ITEMS.name => {
                let count = vars["ids"].as_array().map(Vec::len).unwrap_or(0);
                json!({ "publishManyUsercarts": { "count": count } })
            }
            n if n == queries::CREATE_ORDER.name => {
                let id = store.next_id("order");
                let mut row = vars.clone();
                row["id"] = json!(id);
                store.orders.push(row);
                json!({ "createUserOrder": { "id": id } })
            }
            n if n == queries::PUBLISH_ORDER.name => {
                json!({ "publishUserOrder": { "id": vars["id"] } })
            }
            n if n == queries::ORDERS_BY_OWNER.name
                || n == queries::ORDERS_BY_OWNER_UNORDERED.name =>
            {
                let mut rows: Vec<Value> = store
                    .orders
                    .iter()
                    .filter(|row| row["useremail"] == vars["email"])
                    .cloned()
                    .collect();
                if n == queries::ORDERS_BY_OWNER.name {
                    rows.sort_by(|a, b| {
                        b["orderdate"]
                            .as_str()
                            .unwrap_or_default()
                            .cmp(a["orderdate"].as_str().unwrap_or_default())
                    });
                }
                json!({ "userOrders": rows })
            }
            other => {
                return Err(TransportError::GraphQl(format!("unknown operation {}", other)));
            }
        };

        Ok(data)
    }
}
