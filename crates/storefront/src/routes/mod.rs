//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                  - Liveness
//! GET    /health/ready                            - Store ping, 503 if unavailable
//!
//! # Catalog ({type} is frozen | confection | misc, legacy names accepted)
//! GET    /api/catalog/{type}/products?category=   - Products, optionally by category
//! GET    /api/catalog/{type}/products/{id}        - One product
//! GET    /api/catalog/{type}/categories           - Categories of a type
//! GET    /api/catalog/sizes                       - Frozen-dessert sizes
//! GET    /api/catalog/boxes                       - Confection boxes
//! GET    /api/catalog/toppings                    - Toppings
//! GET    /api/catalog/flavors-of-the-day          - Today's highlighted flavors
//!
//! # Order (state kept in the visitor's session)
//! GET    /order                                   - Current order
//! POST   /order/frozen/size                       - {"size_id"}
//! POST   /order/frozen/flavors/{id}/add|remove
//! POST   /order/frozen/toppings/{id}/toggle
//! POST   /order/frozen/quantity                   - {"quantity"}
//! POST   /order/frozen/commit
//! POST   /order/confection/box                    - {"box_id"}
//! POST   /order/confection/items/{id}/add|remove
//! POST   /order/confection/quantity               - {"quantity"} (boxed)
//! POST   /order/confection/commit
//! POST   /order/misc/items/{id}/add|remove
//! POST   /order/misc/commit
//! DELETE /order/items/{id}
//! POST   /order/reset
//! POST   /order/checkout                          - {"name","delivery","address"}
//! ```

pub mod catalog;
pub mod health;
pub mod order;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Catalog read routes, nested under `/api/catalog`.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/{kind}/products", get(catalog::list_products))
        .route("/{kind}/products/{id}", get(catalog::get_product))
        .route("/{kind}/categories", get(catalog::list_categories))
        .route("/sizes", get(catalog::list_sizes))
        .route("/boxes", get(catalog::list_boxes))
        .route("/toppings", get(catalog::list_toppings))
        .route("/flavors-of-the-day", get(catalog::flavors_of_the_day))
}

/// Order builder routes, nested under `/order`.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(order::show))
        .route("/frozen/size", post(order::select_size))
        .route("/frozen/flavors/{id}/add", post(order::add_flavor))
        .route("/frozen/flavors/{id}/remove", post(order::remove_flavor))
        .route("/frozen/toppings/{id}/toggle", post(order::toggle_topping))
        .route("/frozen/quantity", post(order::set_frozen_quantity))
        .route("/frozen/commit", post(order::commit_frozen))
        .route("/confection/box", post(order::select_box))
        .route("/confection/items/{id}/add", post(order::add_confection))
        .route("/confection/items/{id}/remove", post(order::remove_confection))
        .route("/confection/quantity", post(order::set_box_quantity))
        .route("/confection/commit", post(order::commit_confection))
        .route("/misc/items/{id}/add", post(order::add_misc))
        .route("/misc/items/{id}/remove", post(order::remove_misc))
        .route("/misc/commit", post(order::commit_misc))
        .route("/items/{id}", delete(order::remove_item))
        .route("/reset", post(order::reset))
        .route("/checkout", post(order::checkout))
}

/// All storefront routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/catalog", catalog_routes())
        .nest("/order", order_routes())
}
