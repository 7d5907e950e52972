use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::content::{keys, queries, ContentGateway, GatewayError};
use crate::orders::{NewOrder, Order, OrderLineItem, OrderStatus, PaymentMode};

/// Line item as encoded inside the order row's `items` string
#[derive(Debug, Serialize, Deserialize)]
struct ItemSnapshot {
    id: String,
    email: String,
    image: Option<String>,
    itemname: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
}

#[derive(Debug, Serialize)]
struct OrderRowInput<'a> {
    useremail: &'a str,
    username: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    gst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    deliveryfee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    discount: Decimal,
    couponcode: Option<&'a str>,
    phonenumber: &'a str,
    orderdate: String,
    paymentmode: &'a str,
    paymentid: Option<&'a str>,
    status: &'a str,
    items: String,
    address: &'a str,
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    id: String,
    useremail: String,
    username: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    gst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    deliveryfee: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    discount: Option<Decimal>,
    #[serde(default)]
    couponcode: Option<String>,
    #[serde(default)]
    phonenumber: Option<String>,
    orderdate: DateTime<Utc>,
    paymentmode: String,
    #[serde(default)]
    paymentid: Option<String>,
    status: String,
    items: String,
    address: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = GatewayError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let snapshots: Vec<ItemSnapshot> = serde_json::from_str(&row.items)?;
        let line_items = snapshots
            .into_iter()
            .map(|item| OrderLineItem {
                id: item.id,
                item_name: item.itemname,
                unit_price: item.price,
                image_ref: item.image,
            })
            .collect();

        Ok(Order {
            id: row.id,
            owner_email: row.useremail,
            owner_name: row.username.unwrap_or_else(|| "Guest".to_string()),
            line_items,
            subtotal: row.subtotal,
            tax: row.gst,
            delivery_fee: row.deliveryfee,
            discount: row.discount.unwrap_or(Decimal::ZERO),
            total: row.total,
            coupon_code: row.couponcode,
            payment_mode: PaymentMode::parse(&row.paymentmode).map_err(GatewayError::Decode)?,
            payment_reference: row.paymentid,
            status: OrderStatus::parse(&row.status).map_err(GatewayError::Decode)?,
            phone: row.phonenumber.unwrap_or_default(),
            placed_at: row.orderdate,
            delivery_address: row.address,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RowId {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedOrderRow {
    create_user_order: Option<RowId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrdersData {
    user_orders: Vec<OrderRow>,
}

/// Repository for order rows in the content API
#[derive(Clone)]
pub struct OrderRepository {
    gateway: ContentGateway,
}

impl OrderRepository {
    pub fn new(gateway: ContentGateway) -> Self {
        Self { gateway }
    }

    /// Create and publish an order row with status `pending`
    pub async fn create(&self, order: &NewOrder) -> Result<Order, GatewayError> {
        let snapshots: Vec<ItemSnapshot> = order
            .line_items
            .iter()
            .map(|item| ItemSnapshot {
                id: item.id.clone(),
                email: order.owner_email.clone(),
                image: item.image_ref.clone(),
                itemname: item.item_name.clone(),
                price: item.unit_price,
            })
            .collect();

        let status = OrderStatus::Pending;
        let input = OrderRowInput {
            useremail: &order.owner_email,
            username: &order.owner_name,
            total: order.pricing.total,
            subtotal: order.pricing.subtotal,
            gst: order.pricing.tax,
            deliveryfee: order.pricing.delivery_fee,
            discount: order.pricing.discount,
            couponcode: order.pricing.coupon_code.as_deref(),
            phonenumber: &order.phone,
            orderdate: order.placed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            paymentmode: order.payment_mode.as_str(),
            paymentid: order.payment_reference.as_deref(),
            status: status.as_str(),
            items: serde_json::to_string(&snapshots)?,
            address: &order.delivery_address,
        };

        let created: CreatedOrderRow = self
            .gateway
            .query_as(queries::CREATE_ORDER, serde_json::to_value(&input)?)
            .await?;
        let id = created
            .create_user_order
            .map(|row| row.id)
            .ok_or_else(|| GatewayError::Decode("createUserOrder returned no id".to_string()))?;

        self.gateway.pause_before_publish().await;
        if let Err(err) = self
            .gateway
            .execute(queries::PUBLISH_ORDER, json!({ "id": id }))
            .await
        {
            warn!(id = %id, error = %err, "Failed to publish order row");
        }

        self.gateway.invalidate(&keys::orders(&order.owner_email)).await;
        info!(
            owner = %order.owner_email,
            id = %id,
            total = %order.pricing.total,
            payment_mode = %order.payment_mode,
            "Order created"
        );

        Ok(Order {
            id,
            owner_email: order.owner_email.clone(),
            owner_name: order.owner_name.clone(),
            line_items: order.line_items.clone(),
            subtotal: order.pricing.subtotal,
            tax: order.pricing.tax,
            delivery_fee: order.pricing.delivery_fee,
            discount: order.pricing.discount,
            total: order.pricing.total,
            coupon_code: order.pricing.coupon_code.clone(),
            payment_mode: order.payment_mode,
            payment_reference: order.payment_reference.clone(),
            status,
            phone: order.phone.clone(),
            placed_at: order.placed_at,
            delivery_address: order.delivery_address.clone(),
        })
    }

    /// Orders of `owner`, newest first
    ///
    /// Cached under `user-orders-<owner>`. When the sorted query fails for
    /// any reason other than rate limiting, the unsorted query is tried and
    /// the rows are sorted here instead.
    pub async fn find_by_owner(&self, owner: &str) -> Result<Vec<Order>, GatewayError> {
        let key = keys::orders(owner);
        let variables = json!({ "email": owner });

        let data: OrdersData = match self
            .gateway
            .cached_query_as(&key, queries::ORDERS_BY_OWNER, variables.clone())
            .await
        {
            Ok(data) => data,
            Err(err @ GatewayError::RateLimited { .. }) => return Err(err),
            Err(err) => {
                warn!(owner, error = %err, "Sorted order query failed, using unsorted query");
                self.gateway
                    .cached_query_as(&key, queries::ORDERS_BY_OWNER_UNORDERED, variables)
                    .await?
            }
        };

        let mut orders = data
            .user_orders
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        Ok(orders)
    }
}
