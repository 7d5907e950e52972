// Content Gateway
//
// Uniform entry point for every content API read and write: wraps the
// transport with the retry policy and the response cache.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::content::cache::{ResponseCache, DEFAULT_CACHE_TTL};
use crate::content::error::GatewayError;
use crate::content::queries::Operation;
use crate::content::retry::RetryPolicy;
use crate::content::transport::{GraphqlRequest, GraphqlTransport};

/// Operational tunables of the gateway and the stores built on it
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    pub cache_ttl: Duration,
    pub retry: RetryPolicy,
    /// Wait between creating a row and publishing it
    pub publish_delay: Duration,
    /// Per-index offset between concurrent deletes during a cart clear
    pub delete_stagger: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            retry: RetryPolicy::default(),
            publish_delay: Duration::from_millis(500),
            delete_stagger: Duration::from_millis(200),
        }
    }
}

impl GatewaySettings {
    /// Default settings with every delay set to zero
    pub fn without_delays() -> Self {
        Self {
            retry: RetryPolicy::without_delay(),
            publish_delay: Duration::ZERO,
            delete_stagger: Duration::ZERO,
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct ContentGateway {
    transport: Arc<dyn GraphqlTransport>,
    cache: Arc<ResponseCache>,
    settings: GatewaySettings,
}

impl ContentGateway {
    pub fn new(transport: Arc<dyn GraphqlTransport>, settings: GatewaySettings) -> Self {
        Self {
            transport,
            cache: Arc::new(ResponseCache::new(settings.cache_ttl)),
            settings,
        }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Run `operation` under the retry policy and return the raw `data` object
    pub async fn execute(&self, operation: Operation, variables: Value) -> Result<Value, GatewayError> {
        let request = GraphqlRequest {
            query: operation.document,
            operation_name: operation.name,
            variables,
        };
        let transport = &self.transport;
        let request = &request;

        self.settings
            .retry
            .run(operation.name, move || transport.execute(request))
            .await
            .map_err(|exhausted| {
                GatewayError::from_transport(exhausted.last_error, exhausted.attempts)
            })
    }

    /// Execute and deserialize the `data` object
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        operation: Operation,
        variables: Value,
    ) -> Result<T, GatewayError> {
        let data = self.execute(operation, variables).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Read through the cache under `key`; only successful reads are stored
    pub async fn cached_query_as<T: DeserializeOwned>(
        &self,
        key: &str,
        operation: Operation,
        variables: Value,
    ) -> Result<T, GatewayError> {
        if let Some(data) = self.cache.get(key).await {
            return Ok(serde_json::from_value(data)?);
        }

        debug!(key, operation = operation.name, "Cache miss");
        let data = self.execute(operation, variables).await?;
        let typed = serde_json::from_value(data.clone())?;
        self.cache.insert(key, data).await;
        Ok(typed)
    }

    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    pub async fn invalidate_prefix(&self, prefix: &str) {
        self.cache.invalidate_prefix(prefix).await;
    }

    /// Wait out the configured gap before a publish mutation
    pub async fn pause_before_publish(&self) {
        if !self.settings.publish_delay.is_zero() {
            sleep(self.settings.publish_delay).await;
        }
    }
}
