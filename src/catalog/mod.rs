// Catalog module
// Read-only categories and menu items served from the content API

pub mod handlers;
pub mod models;
pub mod repository;

pub use handlers::*;
pub use models::{Category, MenuItem};
pub use repository::CatalogRepository;
