// GraphQL transport for the headless content API
//
// A transport performs exactly one round trip. Retries, caching and error
// classification live in the gateway above it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::content::error::TransportError;

/// A single GraphQL operation ready to send
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: &'static str,
    pub operation_name: &'static str,
    pub variables: Value,
}

/// Something that can execute a GraphQL request and return its `data` object
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, TransportError>;
}

/// HTTP transport authenticated with a bearer token
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    token: Secret<String>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, token: Secret<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, TransportError> {
        debug!(operation = request.operation_name, "Sending GraphQL request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut payload: Value = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        extract_data(&mut payload)
    }
}

/// Pull the `data` object out of a GraphQL response envelope
fn extract_data(payload: &mut Value) -> Result<Value, TransportError> {
    if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            return Err(TransportError::GraphQl(messages.join("; ")));
        }
    }

    match payload.get_mut("data").map(Value::take) {
        Some(Value::Null) | None => Err(TransportError::Decode(
            "response carried no data".to_string(),
        )),
        Some(data) => Ok(data),
    }
}
