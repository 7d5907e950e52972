// Authentication extractor for protected routes

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::{error::AuthError, token::TokenVerifier};

/// Authenticated storefront user
///
/// The email is the partition key for carts and orders.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub email: String,
    pub name: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        // Verify Bearer token format
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let verifier = Arc::<TokenVerifier>::from_ref(state);
        let claims = verifier.verify(token)?;
        debug!(email = %claims.email, "Authenticated request");

        Ok(AuthenticatedUser {
            email: claims.email,
            name: claims.name,
        })
    }
}
