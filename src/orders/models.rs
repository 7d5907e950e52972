use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::cart::CartLineItem;
use crate::orders::CheckoutState;
use crate::payment::GatewayOrder;
use crate::pricing::PricingBreakdown;

/// Order status as stored on the order row
///
/// Orders are always created `pending`; later changes happen outside the
/// storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parse status from string
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentMode {
    #[serde(rename = "cash_on_delivery", alias = "cod")]
    CashOnDelivery,
    #[serde(rename = "gateway", alias = "razorpay")]
    Gateway,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::CashOnDelivery => "cash_on_delivery",
            PaymentMode::Gateway => "gateway",
        }
    }

    /// Parse a stored payment mode, accepting the legacy short names
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "cash_on_delivery" | "cod" => Ok(PaymentMode::CashOnDelivery),
            "gateway" | "razorpay" => Ok(PaymentMode::Gateway),
            _ => Err(format!("Invalid payment mode: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery address entered at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeliveryAddress {
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Asha Rao")]
    pub full_name: String,

    #[validate(custom = "crate::validation::validate_phone")]
    #[schema(example = "+91 98765 43210")]
    pub phone: String,

    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "12 MG Road")]
    pub address_line: String,

    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Bengaluru")]
    pub city: String,

    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Karnataka")]
    pub state: String,

    #[validate(custom = "crate::validation::validate_pincode")]
    #[schema(example = "560001")]
    pub pincode: String,

    #[serde(default)]
    pub landmark: Option<String>,

    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl DeliveryAddress {
    /// Single-line address stored on the order, landmark appended
    pub fn flattened(&self) -> String {
        let mut text = format!(
            "{}, {}, {} {}",
            self.address_line.trim(),
            self.city.trim(),
            self.state.trim(),
            self.pincode.trim()
        );
        if let Some(landmark) = self.landmark.as_deref().map(str::trim) {
            if !landmark.is_empty() {
                text.push_str(", ");
                text.push_str(landmark);
            }
        }
        text
    }

    /// Phone reduced to its 10 digits
    pub fn normalized_phone(&self) -> String {
        crate::validation::normalize_phone(&self.phone)
    }
}

/// Snapshot of one cart line item, copied onto the order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLineItem {
    pub id: String,
    pub item_name: String,
    #[schema(value_type = String, example = "250")]
    pub unit_price: Decimal,
    pub image_ref: Option<String>,
}

impl From<&CartLineItem> for OrderLineItem {
    fn from(item: &CartLineItem) -> Self {
        OrderLineItem {
            id: item.id.clone(),
            item_name: item.item_name.clone(),
            unit_price: item.unit_price,
            image_ref: item.image_ref.clone(),
        }
    }
}

/// An order as persisted in the content API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: String,
    pub owner_email: String,
    pub owner_name: String,
    pub line_items: Vec<OrderLineItem>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub tax: Decimal,
    #[schema(value_type = String)]
    pub delivery_fee: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub coupon_code: Option<String>,
    pub payment_mode: PaymentMode,
    pub payment_reference: Option<String>,
    pub status: OrderStatus,
    pub phone: String,
    pub placed_at: DateTime<Utc>,
    pub delivery_address: String,
}

/// Everything needed to create an order row
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner_email: String,
    pub owner_name: String,
    pub line_items: Vec<OrderLineItem>,
    pub pricing: PricingBreakdown,
    pub payment_mode: PaymentMode,
    pub payment_reference: Option<String>,
    pub phone: String,
    pub delivery_address: String,
    pub placed_at: DateTime<Utc>,
}

/// Request body for POST /api/checkout
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[validate]
    pub address: DeliveryAddress,
    pub payment_mode: PaymentMode,
    #[serde(default)]
    #[schema(example = "WELCOME15")]
    pub coupon_code: Option<String>,
}

/// Request body for POST /api/checkout/:attempt_id/complete
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaymentReport {
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

/// What the UI shows once the order exists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderConfirmation {
    pub order_id: String,
    #[schema(value_type = String, example = "404")]
    pub total: Decimal,
    pub payment_mode: PaymentMode,
    pub address: String,
    pub order: Order,
}

/// Details the UI needs to open the payment widget
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingPayment {
    pub attempt_id: Uuid,
    pub gateway_order: GatewayOrder,
    /// Public key for the payment widget
    pub key_id: String,
    pub pricing: PricingBreakdown,
}

/// Result of a checkout step
///
/// `confirmation` is set once the workflow reaches `confirmed`; `payment`
/// is set while it waits in `awaiting_payment`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub status: CheckoutState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<OrderConfirmation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PendingPayment>,
    /// States visited by this attempt, in order
    pub trail: Vec<CheckoutState>,
}
