//! Catalog read handlers.
//!
//! Backed by [`CatalogReader`](gante_catalog::CatalogReader): a store outage
//! shows up as empty lists, never as an error status.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use gante_core::{
    BoxOption, Category, CategoryFilter, Product, ProductId, ProductType, SizeOption, Topping,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for product listings.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    /// Category id, or `all` / `todos` / absent for every category.
    pub category: Option<String>,
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Path(kind): Path<ProductType>,
    Query(query): Query<ProductQuery>,
) -> Json<Vec<Product>> {
    let filter = CategoryFilter::parse(query.category.as_deref());
    Json(state.catalog().list_products_by_category(kind, &filter).await)
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path((kind, id)): Path<(ProductType, ProductId)>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .get_product(kind, &id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    Path(kind): Path<ProductType>,
) -> Json<Vec<Category>> {
    Json(state.catalog().list_categories(kind).await)
}

#[instrument(skip(state))]
pub async fn list_sizes(State(state): State<AppState>) -> Json<Vec<SizeOption>> {
    Json(state.catalog().list_sizes().await)
}

#[instrument(skip(state))]
pub async fn list_boxes(State(state): State<AppState>) -> Json<Vec<BoxOption>> {
    Json(state.catalog().list_boxes().await)
}

#[instrument(skip(state))]
pub async fn list_toppings(State(state): State<AppState>) -> Json<Vec<Topping>> {
    Json(state.catalog().list_toppings().await)
}

#[instrument(skip(state))]
pub async fn flavors_of_the_day(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.catalog().list_flavors_of_the_day().await)
}
