use std::sync::Arc;

use storefront_api::config::Config;
use storefront_api::content::{GatewaySettings, HttpTransport};
use storefront_api::{create_router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // RUST_LOG wins; otherwise log at info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Storefront API - Starting...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error_code = err.error_code(), "Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    if config.payment_timeout.is_none() {
        tracing::info!("No payment timeout configured, gateway attempts wait indefinitely");
    }

    let transport = Arc::new(HttpTransport::new(
        config.content.url.clone(),
        config.content.token.clone(),
    ));
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::new(config, transport, GatewaySettings::default());
    let app = create_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Storefront API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
