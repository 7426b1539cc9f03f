//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                           - Liveness
//! GET    /health/ready                     - Store ping, 503 if unavailable
//!
//! # Everything below needs the proxy identity header
//! GET    /api/products?type=&category=     - Products, every type when `type` is absent
//! POST   /api/products                     - Create
//! PUT    /api/products/{id}                - Partial update
//! DELETE /api/products/{id}?confirm=true
//! GET    /api/categories?type=
//! POST   /api/categories
//! PUT    /api/categories/{id}              - Rename
//! DELETE /api/categories/{id}?confirm=true
//! GET    /api/sizes | /api/boxes | /api/toppings
//! POST   /api/sizes | /api/boxes | /api/toppings          - Create or replace by body id
//! PUT    /api/{sizes,boxes,toppings}/{id}                 - Replace
//! DELETE /api/{sizes,boxes,toppings}/{id}?confirm=true
//! GET    /api/flavors-of-the-day
//! PUT    /api/flavors-of-the-day           - {"product_ids": [...]}
//! ```

pub mod categories;
pub mod extras;
pub mod flavors;
pub mod health;
pub mod products;

use axum::{
    Router,
    routing::{get, put},
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query string every delete needs.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

impl ConfirmQuery {
    /// Refuse the delete unless the caller passed `confirm=true`.
    pub fn require(&self) -> Result<()> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::BadRequest(
                "Confirme a exclusao com confirm=true.".to_string(),
            ))
        }
    }
}

/// Catalog management routes, nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(products::list).post(products::create),
        )
        .route(
            "/products/{id}",
            put(products::update).delete(products::delete),
        )
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            put(categories::update).delete(categories::delete),
        )
        .route("/sizes", get(extras::list_sizes).post(extras::create_size))
        .route(
            "/sizes/{id}",
            put(extras::replace_size).delete(extras::delete_size),
        )
        .route("/boxes", get(extras::list_boxes).post(extras::create_box))
        .route(
            "/boxes/{id}",
            put(extras::replace_box).delete(extras::delete_box),
        )
        .route(
            "/toppings",
            get(extras::list_toppings).post(extras::create_topping),
        )
        .route(
            "/toppings/{id}",
            put(extras::replace_topping).delete(extras::delete_topping),
        )
        .route(
            "/flavors-of-the-day",
            get(flavors::list).put(flavors::replace),
        )
}

/// All admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_needs_confirmation() {
        assert!(ConfirmQuery::default().require().is_err());
        assert!(ConfirmQuery { confirm: true }.require().is_ok());
    }
}
