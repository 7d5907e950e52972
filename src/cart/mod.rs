// Cart Store module
// Per-owner cart rows kept in the content API, plus the optimistic
// item counter shown in the storefront header

pub mod counter;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use counter::CartCounter;
pub use error::CartError;
pub use handlers::*;
pub use models::{AddedCartItem, CartLineItem, CartSelection, ClearedCart, NewCartItem};
pub use repository::CartRepository;
pub use service::CartStore;
