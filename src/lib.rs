pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod orders;
pub mod payment;
pub mod pricing;
pub mod validation;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::TokenVerifier;
use crate::cart::{CartRepository, CartStore};
use crate::catalog::CatalogRepository;
use crate::config::Config;
use crate::content::{ContentGateway, GatewaySettings, GraphqlTransport};
use crate::orders::{CheckoutWorkflow, OrderRepository};
use crate::payment::PaymentGateway;
use crate::pricing::CouponTable;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        catalog::handlers::list_categories,
        catalog::handlers::list_menu_items,
        cart::handlers::list_cart,
        cart::handlers::add_to_cart,
        cart::handlers::cart_count,
        cart::handlers::remove_from_cart,
        cart::handlers::clear_cart,
        pricing::handlers::quote_cart,
        orders::handlers::start_checkout,
        orders::handlers::complete_checkout_payment,
        orders::handlers::cancel_checkout_payment,
        orders::handlers::list_orders,
        payment::handlers::create_payment_order,
        payment::handlers::verify_payment,
    ),
    components(
        schemas(
            error::ErrorResponse,
            catalog::Category,
            catalog::MenuItem,
            cart::CartLineItem,
            cart::CartSelection,
            cart::AddedCartItem,
            cart::ClearedCart,
            cart::CartCount,
            pricing::PricingBreakdown,
            pricing::QuoteRequest,
            orders::CheckoutRequest,
            orders::CheckoutResponse,
            orders::CheckoutState,
            orders::DeliveryAddress,
            orders::PaymentMode,
            orders::PaymentReport,
            orders::PendingPayment,
            orders::OrderConfirmation,
            orders::Order,
            orders::OrderLineItem,
            orders::OrderStatus,
            payment::GatewayOrder,
            payment::CreatePaymentOrderRequest,
            payment::PaymentOrderResponse,
            payment::VerifyPaymentRequest,
            payment::VerifyPaymentResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "catalog", description = "Menu categories and dishes"),
        (name = "cart", description = "Caller's cart and pricing quotes"),
        (name = "checkout", description = "Checkout workflow"),
        (name = "orders", description = "Order history"),
        (name = "payments", description = "Payment gateway order and verification")
    ),
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = "Cart, pricing, checkout and payment API for the restaurant storefront"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogRepository,
    pub cart: CartStore,
    pub checkout: CheckoutWorkflow,
    pub orders: OrderRepository,
    pub payments: Arc<PaymentGateway>,
    pub coupons: Arc<CouponTable>,
    pub tokens: Arc<TokenVerifier>,
}

impl AppState {
    /// Wire every store to one content gateway over `transport`
    pub fn new(
        config: Config,
        transport: Arc<dyn GraphqlTransport>,
        settings: GatewaySettings,
    ) -> Self {
        let gateway = ContentGateway::new(transport, settings);
        let catalog = CatalogRepository::new(gateway.clone());
        let cart = CartStore::new(CartRepository::new(gateway.clone()), catalog.clone());
        let orders = OrderRepository::new(gateway);
        let payments = Arc::new(PaymentGateway::new(config.payment));
        let coupons = Arc::new(config.coupons);

        let checkout = CheckoutWorkflow::new(
            cart.clone(),
            orders.clone(),
            Arc::clone(&payments),
            Arc::clone(&coupons),
            config.payment_timeout,
        );

        Self {
            catalog,
            cart,
            checkout,
            orders,
            payments,
            coupons,
            tokens: Arc::new(TokenVerifier::new(config.identity_secret)),
        }
    }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.tokens)
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        // Catalog
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/categories/:slug/items", get(catalog::list_menu_items))
        // Cart
        .route(
            "/api/cart",
            get(cart::list_cart)
                .post(cart::add_to_cart)
                .delete(cart::clear_cart),
        )
        .route("/api/cart/count", get(cart::cart_count))
        .route("/api/cart/quote", post(pricing::quote_cart))
        .route("/api/cart/:id", axum::routing::delete(cart::remove_from_cart))
        // Checkout and orders
        .route("/api/checkout", post(orders::start_checkout))
        .route(
            "/api/checkout/:attempt_id/complete",
            post(orders::complete_checkout_payment),
        )
        .route(
            "/api/checkout/:attempt_id/cancel",
            post(orders::cancel_checkout_payment),
        )
        .route("/api/orders", get(orders::list_orders))
        // Payments
        .route("/api/payments/order", post(payment::create_payment_order))
        .route("/api/payments/verify", post(payment::verify_payment))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod tests;
