// Authentication module
// Verifies bearer tokens issued by the external identity provider; sign-up
// and login happen there, not in this service

pub mod error;
pub mod middleware;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::AuthenticatedUser;
pub use token::{IdentityClaims, TokenVerifier};
