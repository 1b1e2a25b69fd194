//! HTTP surface.
//!
//! Routes fall into four groups: public storefront calls, calls scoped to the
//! authenticated caller, internal calls from webhook automation (shared key)
//! and admin calls behind the [`AdminGate`](crate::AdminGate).

mod error;
mod extract;
mod handlers;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::services::Services;

pub use extract::{Caller, InternalCaller, INTERNAL_KEY_HEADER};

#[derive(Clone, Debug)]
pub struct AppState {
    pub services: Services,
    pub internal_api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(services: Services, internal_api_key: Option<String>) -> Self {
        Self { services, internal_api_key: internal_api_key.map(Arc::from) }
    }
}

pub fn router(state: AppState) -> Router {
    use handlers::*;

    let public = Router::new()
        .route("/api/v1/orders", post(create_order))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/categories", get(list_categories))
        .route("/api/v1/tags", get(list_tags))
        .route("/api/v1/checkout/payment-intent", post(create_payment_intent));

    let caller = Router::new()
        .route("/api/v1/me/orders", get(my_orders))
        .route("/api/v1/visits", post(track_visit))
        .route("/api/v1/users/store", post(store_user))
        .route("/api/v1/users/me", get(current_user));

    let internal = Router::new()
        .route("/internal/orders", post(create_order_internal))
        .route("/internal/checkouts", post(create_checkout))
        .route("/internal/checkouts/:session_id", get(get_checkout))
        .route("/internal/checkouts/:session_id/complete", post(complete_checkout))
        .route("/internal/webhooks/payment-succeeded", post(payment_succeeded));

    let admin = Router::new()
        .route("/api/v1/admin/orders", get(admin_orders))
        .route("/api/v1/admin/orders/:id/status", put(update_order_status))
        .route("/api/v1/admin/products", get(admin_products).post(create_product))
        .route("/api/v1/admin/products/:id", put(update_product).delete(delete_product))
        .route("/api/v1/admin/categories", post(create_category))
        .route("/api/v1/admin/categories/:id", put(update_category).delete(delete_category))
        .route("/api/v1/admin/tags", post(create_tag))
        .route("/api/v1/admin/tags/:id", axum::routing::delete(delete_tag))
        .route("/api/v1/admin/dashboard", get(dashboard))
        .route("/api/v1/admin/dashboard/items", post(add_dashboard_item))
        .route("/api/v1/admin/visitors", get(visitor_count))
        .route("/api/v1/admin/sales", get(list_sales).post(create_sale));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-storefront"})) }))
        .merge(public)
        .merge(caller)
        .merge(internal)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
