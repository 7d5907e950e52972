//! Razorpay-style payment gateway client.
//!
//! Creates payment orders through the gateway's Orders API and verifies
//! the signature the checkout widget hands back on success.

use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use utoipa::ToSchema;

use crate::payment::PaymentError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// Public key id, also handed to the checkout widget
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub api_base_url: String,
    pub currency: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Payment order as returned by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GatewayOrder {
    /// Gateway order id, e.g. `order_9A33XWu170gUtm`
    pub id: String,
    /// Amount in the smallest currency subunit
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetail {
    code: String,
    description: String,
}

#[derive(Clone)]
pub struct PaymentGateway {
    client: Client,
    config: RazorpayConfig,
}

impl PaymentGateway {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Both the key id and the secret are present
    pub fn is_configured(&self) -> bool {
        !self.config.key_id.trim().is_empty()
            && !self.config.key_secret.expose_secret().trim().is_empty()
    }

    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    /// Create a payment order for `amount_subunits`.
    ///
    /// Missing credentials and non-positive amounts are rejected before any
    /// request is sent.
    pub async fn create_payment_order(
        &self,
        amount_subunits: i64,
        currency: &str,
        receipt_id: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        if !self.is_configured() {
            return Err(PaymentError::CredentialsMissing);
        }
        if amount_subunits <= 0 {
            return Err(PaymentError::InvalidAmount(amount_subunits));
        }

        let request = CreateOrderRequest {
            amount: amount_subunits,
            currency,
            receipt: receipt_id,
        };
        let url = format!("{}/orders", self.config.api_base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Payment gateway create order response");

        if status.is_success() {
            let order: GatewayOrder = serde_json::from_str(&body)
                .map_err(|e| PaymentError::Unavailable(format!("unreadable order: {}", e)))?;
            tracing::info!(
                order_id = %order.id,
                amount = order.amount,
                currency = %order.currency,
                receipt = receipt_id,
                "Payment order created"
            );
            Ok(order)
        } else {
            let detail = serde_json::from_str::<GatewayErrorBody>(&body)
                .map(|parsed| parsed.error)
                .unwrap_or_else(|_| GatewayErrorDetail {
                    code: status.as_u16().to_string(),
                    description: body.clone(),
                });
            tracing::error!(
                code = %detail.code,
                description = %detail.description,
                "Payment order creation failed"
            );
            Err(PaymentError::Gateway {
                code: detail.code,
                description: detail.description,
            })
        }
    }

    /// Check a checkout signature against `order_id|payment_id`.
    ///
    /// Any empty input is `Ok(false)` without computing the HMAC. A missing
    /// secret is an error rather than a silent mismatch.
    pub fn verify_payment_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, PaymentError> {
        if gateway_order_id.is_empty() || payment_id.is_empty() || signature.is_empty() {
            return Ok(false);
        }

        let secret = self.config.key_secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(PaymentError::CredentialsMissing);
        }

        let expected = sign_payment(gateway_order_id, payment_id, secret)?;
        let is_valid: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();

        if is_valid {
            tracing::info!(
                order_id = gateway_order_id,
                payment_id,
                "Payment signature verified"
            );
        } else {
            tracing::warn!(
                order_id = gateway_order_id,
                payment_id,
                "Payment signature verification failed"
            );
        }

        Ok(is_valid)
    }
}

/// Hex-encoded HMAC-SHA256 of `order_id|payment_id` under `secret`
pub fn sign_payment(
    gateway_order_id: &str,
    payment_id: &str,
    secret: &str,
) -> Result<String, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::CredentialsMissing)?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
