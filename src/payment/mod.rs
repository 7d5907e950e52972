// Payment Gateway Adapter module
// Razorpay-style Orders API (create a payment order) and checkout
// signature verification

pub mod error;
pub mod gateway;
pub mod handlers;

pub use error::PaymentError;
pub use gateway::{sign_payment, GatewayOrder, PaymentGateway, RazorpayConfig};
pub use handlers::*;
