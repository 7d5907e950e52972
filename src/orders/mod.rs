// Orders module
// Checkout state machine and workflow, duplicate-submission guard, order
// persistence and order history.

pub mod error;
pub mod handlers;
pub mod idempotency;
pub mod models;
pub mod repository;
pub mod status_machine;
pub mod workflow;

pub use error::CheckoutError;
pub use handlers::*;
pub use idempotency::{idempotency_key, InFlightGuard, InFlightTicket};
pub use models::*;
pub use repository::OrderRepository;
pub use status_machine::{CheckoutState, CheckoutStateMachine, CheckoutTrail};
pub use workflow::CheckoutWorkflow;
