// Pricing module
// Pricing Engine (subtotal, tax, delivery fee, discount, total) and the
// static coupon table it draws discounts from.

pub mod coupons;
pub mod engine;
pub mod handlers;

pub use coupons::{Coupon, CouponKind, CouponRejection, CouponTable};
pub use engine::{PricingBreakdown, PricingEngine, DELIVERY_FEE, FREE_DELIVERY_THRESHOLD, TAX_RATE};
pub use handlers::*;
