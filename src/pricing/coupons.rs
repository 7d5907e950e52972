// Coupon table and resolution
//
// Coupons are static configuration: a code, a discount kind and the
// thresholds that gate it. They are applied transiently to a pricing
// computation and carry no per-user redemption state.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// How a coupon's `value` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// `value` is percentage points of the subtotal (e.g. 15 = 15% off)
    Percentage,

    /// `value` is a currency amount taken off verbatim
    Fixed,
}

impl fmt::Display for CouponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponKind::Percentage => write!(f, "percentage"),
            CouponKind::Fixed => write!(f, "fixed"),
        }
    }
}

/// A single coupon rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coupon {
    #[schema(example = "WELCOME15")]
    pub code: String,
    pub kind: CouponKind,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 15)]
    pub value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 500)]
    pub minimum_subtotal: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>, example = 150)]
    pub maximum_discount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Coupon {
    /// Whether the coupon may be applied to the given subtotal
    pub fn applies_to(&self, subtotal: Decimal) -> bool {
        subtotal >= self.minimum_subtotal
    }

    /// Discount this coupon yields for `subtotal`, ignoring the minimum.
    ///
    /// Percentage discounts are rounded half-up to whole currency units and
    /// then capped by `maximum_discount`. Fixed discounts are returned as-is,
    /// even when they exceed the subtotal.
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        match self.kind {
            CouponKind::Percentage => {
                let raw = (subtotal * self.value / Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
                match self.maximum_discount {
                    Some(cap) if raw > cap => cap,
                    _ => raw,
                }
            }
            CouponKind::Fixed => self.value,
        }
    }
}

/// Why a coupon code could not be applied
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CouponRejection {
    #[error("Coupon code '{0}' does not exist")]
    NotFound(String),

    #[error("Coupon '{code}' requires a minimum subtotal of {minimum}")]
    BelowMinimum { code: String, minimum: Decimal },
}

impl CouponRejection {
    /// Machine-readable rejection reason
    pub fn reason(&self) -> &'static str {
        match self {
            CouponRejection::NotFound(_) => "not_found",
            CouponRejection::BelowMinimum { .. } => "below_minimum",
        }
    }
}

/// Immutable set of coupons available to the storefront
#[derive(Debug, Clone, PartialEq)]
pub struct CouponTable {
    coupons: Vec<Coupon>,
}

impl CouponTable {
    pub fn new(coupons: Vec<Coupon>) -> Self {
        Self { coupons }
    }

    /// The coupons shipped with the storefront
    pub fn builtin() -> Self {
        Self::new(vec![
            Coupon {
                code: "FIRST10".to_string(),
                kind: CouponKind::Percentage,
                value: Decimal::from(10),
                minimum_subtotal: Decimal::from(200),
                maximum_discount: Some(Decimal::from(100)),
                description: Some("10% off on first order (min 200)".to_string()),
            },
            Coupon {
                code: "SAVE50".to_string(),
                kind: CouponKind::Fixed,
                value: Decimal::from(50),
                minimum_subtotal: Decimal::from(300),
                maximum_discount: None,
                description: Some("50 off on orders above 300".to_string()),
            },
            Coupon {
                code: "WELCOME15".to_string(),
                kind: CouponKind::Percentage,
                value: Decimal::from(15),
                minimum_subtotal: Decimal::from(500),
                maximum_discount: Some(Decimal::from(150)),
                description: Some("15% off on orders above 500".to_string()),
            },
        ])
    }

    /// Parse a coupon table from a JSON array
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let coupons: Vec<Coupon> = serde_json::from_str(raw)?;
        Ok(Self::new(coupons))
    }

    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    /// Case-insensitive exact lookup; callers trim user input first
    pub fn find(&self, code: &str) -> Option<&Coupon> {
        self.coupons
            .iter()
            .find(|coupon| coupon.code.eq_ignore_ascii_case(code))
    }

    /// Resolve a code against the table and the current subtotal
    pub fn resolve(&self, code: &str, subtotal: Decimal) -> Result<Coupon, CouponRejection> {
        let coupon = self
            .find(code)
            .ok_or_else(|| CouponRejection::NotFound(code.to_string()))?;

        if !coupon.applies_to(subtotal) {
            tracing::debug!(
                code = %coupon.code,
                subtotal = %subtotal,
                minimum = %coupon.minimum_subtotal,
                "Coupon rejected below minimum subtotal"
            );
            return Err(CouponRejection::BelowMinimum {
                code: coupon.code.clone(),
                minimum: coupon.minimum_subtotal,
            });
        }

        Ok(coupon.clone())
    }
}

impl Default for CouponTable {
    fn default() -> Self {
        Self::builtin()
    }
}
