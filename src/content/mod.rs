// Content Gateway module
//
// Everything the storefront keeps remotely (catalog, cart rows, orders)
// lives in a hosted GraphQL content API. This module owns the transport,
// retry policy, response cache and the operation documents.

pub mod cache;
pub mod error;
pub mod gateway;
pub mod queries;
pub mod retry;
pub mod transport;

pub use cache::{keys, ResponseCache};
pub use error::{GatewayError, TransportError};
pub use gateway::{ContentGateway, GatewaySettings};
pub use queries::Operation;
pub use retry::RetryPolicy;
pub use transport::{GraphqlRequest, GraphqlTransport, HttpTransport};
