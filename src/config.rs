// Environment configuration
//
// Every value is read from the process environment (after `.env` has been
// loaded by `main`). Missing required values abort startup.

use secrecy::Secret;
use std::env;
use std::time::Duration;

use crate::payment::RazorpayConfig;
use crate::pricing::CouponTable;

pub const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";
pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Missing(_) => "config_missing",
            ConfigError::Invalid { .. } => "config_invalid",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ContentApiConfig {
    pub url: String,
    pub token: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub content: ContentApiConfig,
    pub payment: RazorpayConfig,
    pub identity_secret: Secret<String>,
    /// Optional deadline for completing a gateway payment
    pub payment_timeout: Option<Duration>,
    pub coupons: CouponTable,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let content = ContentApiConfig {
            url: required("CONTENT_API_URL")?,
            token: Secret::new(required("CONTENT_API_TOKEN")?),
        };

        let payment = RazorpayConfig {
            key_id: required("RAZORPAY_KEY_ID")?,
            key_secret: Secret::new(required("RAZORPAY_KEY_SECRET")?),
            api_base_url: optional("RAZORPAY_API_URL")
                .unwrap_or_else(|| DEFAULT_RAZORPAY_API_URL.to_string()),
            currency: optional("PAYMENT_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        };

        let identity_secret = Secret::new(required("IDENTITY_JWT_SECRET")?);

        let host = optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match optional("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("'{}' is not a port number", raw),
            })?,
            None => 8080,
        };

        let payment_timeout = match optional("PAYMENT_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "PAYMENT_TIMEOUT_SECS",
                    reason: format!("'{}' is not a number of seconds", raw),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let coupons = match optional("STOREFRONT_COUPONS") {
            Some(raw) => CouponTable::from_json(&raw).map_err(|e| ConfigError::Invalid {
                name: "STOREFRONT_COUPONS",
                reason: e.to_string(),
            })?,
            None => CouponTable::builtin(),
        };

        Ok(Self {
            server: ServerConfig { host, port },
            content,
            payment,
            identity_secret,
            payment_timeout,
            coupons,
        })
    }
}
