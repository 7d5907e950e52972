// Pricing Engine
//
// Turns a list of cart line items (plus an optional coupon) into the
// subtotal / tax / delivery fee / discount / total breakdown shown at
// checkout and persisted on the order.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cart::CartLineItem;
use crate::pricing::Coupon;

/// Tax rate applied to the subtotal (18%)
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Subtotals strictly above this ship for free
pub const FREE_DELIVERY_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Flat delivery fee charged at or below the threshold
pub const DELIVERY_FEE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Derived pricing for a set of line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricingBreakdown {
    #[schema(value_type = String, example = "300")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "54")]
    pub tax: Decimal,
    #[schema(value_type = String, example = "50")]
    pub delivery_fee: Decimal,
    #[schema(value_type = String, example = "0")]
    pub discount: Decimal,
    #[schema(value_type = String, example = "404")]
    pub total: Decimal,
    /// Code of the coupon that produced `discount`, if any
    pub coupon_code: Option<String>,
}

impl PricingBreakdown {
    /// Total expressed in the smallest currency subunit (e.g. paise)
    pub fn total_in_subunits(&self) -> i64 {
        (self.total * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(0)
    }
}

/// Stateless pricing calculator
pub struct PricingEngine;

impl PricingEngine {
    /// Compute the full breakdown for `items` with an optional coupon.
    ///
    /// Never fails. The coupon only contributes when the subtotal meets its
    /// minimum, and the total is clamped at zero.
    pub fn compute_pricing(items: &[CartLineItem], coupon: Option<&Coupon>) -> PricingBreakdown {
        let subtotal = Self::calculate_subtotal(items);
        let tax = Self::calculate_tax(subtotal);
        let delivery_fee = Self::calculate_delivery_fee(subtotal);

        let applied = coupon.filter(|coupon| coupon.applies_to(subtotal));
        let discount = applied
            .map(|coupon| coupon.discount_for(subtotal))
            .unwrap_or(Decimal::ZERO);

        let total = (subtotal + tax + delivery_fee - discount).max(Decimal::ZERO);

        PricingBreakdown {
            subtotal,
            tax,
            delivery_fee,
            discount,
            total,
            coupon_code: applied.map(|coupon| coupon.code.clone()),
        }
    }

    /// Sum of unit prices; one line item is one unit
    pub fn calculate_subtotal(items: &[CartLineItem]) -> Decimal {
        items.iter().map(|item| item.unit_price).sum()
    }

    /// Tax on the subtotal, rounded half-up to a whole currency unit
    pub fn calculate_tax(subtotal: Decimal) -> Decimal {
        (subtotal * TAX_RATE).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Free delivery only when the subtotal is strictly above the threshold
    pub fn calculate_delivery_fee(subtotal: Decimal) -> Decimal {
        if subtotal > FREE_DELIVERY_THRESHOLD {
            Decimal::ZERO
        } else {
            DELIVERY_FEE
        }
    }
}
