// HTTP handlers for payment endpoints used by the checkout widget

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::payment::{GatewayOrder, PaymentError};

/// Request body for POST /api/payments/order
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentOrderRequest {
    /// Amount in the smallest currency subunit (paise for INR)
    #[schema(example = 40400)]
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub receipt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentOrderResponse {
    pub order: GatewayOrder,
    /// Public key the checkout widget must be opened with
    pub key_id: String,
}

/// Request body for POST /api/payments/verify
///
/// Accepts both the camelCase names and the `razorpay_*` names the
/// checkout widget reports.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    #[serde(rename = "gatewayOrderId", alias = "razorpay_order_id")]
    pub gateway_order_id: Option<String>,
    #[serde(rename = "paymentId", alias = "razorpay_payment_id")]
    pub payment_id: Option<String>,
    #[serde(alias = "razorpay_signature")]
    pub signature: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handler for POST /api/payments/order
#[utoipa::path(
    post,
    path = "/api/payments/order",
    request_body = CreatePaymentOrderRequest,
    responses(
        (status = 200, description = "Payment order created", body = PaymentOrderResponse),
        (status = 400, description = "Amount missing or not positive"),
        (status = 500, description = "Gateway credentials missing"),
        (status = 502, description = "Gateway rejected the order")
    ),
    tag = "payments"
)]
pub async fn create_payment_order(
    State(state): State<crate::AppState>,
    Json(request): Json<CreatePaymentOrderRequest>,
) -> Result<Json<PaymentOrderResponse>, PaymentError> {
    let gateway = &state.payments;
    let currency = request
        .currency
        .unwrap_or_else(|| gateway.currency().to_string());
    let receipt = request
        .receipt
        .unwrap_or_else(|| format!("rcpt_{}", chrono::Utc::now().timestamp_millis()));

    let order = gateway
        .create_payment_order(request.amount.unwrap_or(0), &currency, &receipt)
        .await?;

    Ok(Json(PaymentOrderResponse {
        order,
        key_id: gateway.key_id().to_string(),
    }))
}

/// Handler for POST /api/payments/verify
#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyPaymentResponse),
        (status = 400, description = "A verification field is missing", body = VerifyPaymentResponse),
        (status = 500, description = "Gateway secret missing", body = VerifyPaymentResponse)
    ),
    tag = "payments"
)]
pub async fn verify_payment(
    State(state): State<crate::AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> (StatusCode, Json<VerifyPaymentResponse>) {
    let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());

    if !(present(&request.gateway_order_id)
        && present(&request.payment_id)
        && present(&request.signature))
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(VerifyPaymentResponse {
                valid: false,
                error: Some("Missing verification fields".to_string()),
            }),
        );
    }

    let result = state.payments.verify_payment_signature(
        request.gateway_order_id.as_deref().unwrap_or_default(),
        request.payment_id.as_deref().unwrap_or_default(),
        request.signature.as_deref().unwrap_or_default(),
    );

    match result {
        Ok(valid) => (StatusCode::OK, Json(VerifyPaymentResponse { valid, error: None })),
        Err(err) => {
            tracing::error!("Payment verification unavailable: {}", err);
            (
                err.status_code(),
                Json(VerifyPaymentResponse {
                    valid: false,
                    error: Some(err.user_message()),
                }),
            )
        }
    }
}
