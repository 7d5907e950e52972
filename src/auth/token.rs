// Identity token verification
//
// Tokens are minted by the identity provider and signed with a shared
// HMAC secret. This service only verifies them.

use crate::auth::error::AuthError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Claims the storefront relies on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

pub struct TokenVerifier {
    secret: Secret<String>,
}

impl TokenVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// Validate signature and expiry, returning the identity claims
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        let claims = decode::<IdentityClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })?;

        if claims.email.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Mint a token the way the identity provider would
    #[cfg(test)]
    pub fn issue(&self, email: &str, name: Option<&str>, ttl_secs: i64) -> String {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let now = chrono::Utc::now().timestamp();
        let claims = IdentityClaims {
            sub: format!("user_{}", email),
            email: email.to_string(),
            name: name.map(str::to_string),
            iat: now,
            exp: now + ttl_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .expect("test token encodes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn verifier(secret: &str) -> TokenVerifier {
        TokenVerifier::new(Secret::new(secret.to_string()))
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let verifier = verifier("identity-secret");
        let token = verifier.issue("diner@example.com", Some("Asha"), 900);

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.email, "diner@example.com");
        assert_eq!(claims.name.as_deref(), Some("Asha"));
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let verifier = verifier("identity-secret");
        // Past the default 60s leeway
        let token = verifier.issue("diner@example.com", None, -300);
        assert_eq!(verifier.verify(&token).unwrap_err(), AuthError::ExpiredToken);
    }

    #[test]
    fn test_token_signature_verification() {
        let token = verifier("secret1").issue("diner@example.com", None, 900);
        assert!(verifier("secret1").verify(&token).is_ok());
        assert_eq!(
            verifier("secret2").verify(&token).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let verifier = verifier("identity-secret");
        assert!(verifier.verify("").is_err());
        assert!(verifier.verify("not.a.token").is_err());
        assert!(verifier
            .verify("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature")
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_claims_round_trip_email(email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)") {
            let verifier = verifier("identity-secret");
            let token = verifier.issue(&email, None, 900);
            let claims = verifier.verify(&token).unwrap();
            prop_assert_eq!(claims.email, email);
        }

        #[test]
        fn prop_random_strings_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            prop_assert!(verifier("identity-secret").verify(&malformed).is_err());
        }
    }
}
