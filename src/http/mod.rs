//! HTTP surface.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::messaging::EventPublisher;
use crate::services::{CartService, CatalogService, CheckoutService, OrderService};
use crate::store::{CartRepository, CatalogRepository, OrderRepository};

pub mod caller;
pub mod error;
pub mod extract;
mod handlers;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub orders: OrderService,
    pub admin_role: Arc<str>,
}

impl AppState {
    /// Wires every service onto one store.
    pub fn new<S>(store: Arc<S>, events: Arc<dyn EventPublisher>, admin_role: &str) -> Self
    where
        S: CatalogRepository + CartRepository + OrderRepository + 'static,
    {
        let products: Arc<dyn CatalogRepository> = store.clone();
        let carts: Arc<dyn CartRepository> = store.clone();
        let orders: Arc<dyn OrderRepository> = store;
        Self {
            catalog: CatalogService::new(products.clone()),
            carts: CartService::new(carts.clone(), products),
            checkout: CheckoutService::new(carts, orders.clone(), events),
            orders: OrderService::new(orders),
            admin_role: Arc::from(admin_role),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-storefront"})) }))
        .route("/api/v1/products", get(handlers::list_products).post(handlers::create_product))
        .route("/api/v1/products/:id", get(handlers::get_product))
        .route("/api/v1/carts", get(handlers::get_cart).post(handlers::add_to_cart))
        .route("/api/v1/carts/:cart_id/checkout", post(handlers::checkout))
        .route("/api/v1/orders", get(handlers::list_orders))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
