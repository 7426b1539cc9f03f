//! Product management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use gante_catalog::{NewProduct, ProductPatch};
use gante_core::{CategoryFilter, Product, ProductId, ProductType};

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::routes::ConfirmQuery;
use crate::services::catalog;
use crate::state::AppState;

/// Listing filters.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    /// Product type; every type when absent.
    #[serde(default, rename = "type")]
    pub kind: Option<ProductType>,
    /// Category id, or `all` / `todos` / absent for every category.
    pub category: Option<String>,
    /// Case-insensitive text looked up in name and description.
    pub search: Option<String>,
}

/// Lowercased search needle, or `None` when blank.
fn search_needle(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn matches_search(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
}

#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<ProductQuery>,
) -> Json<Vec<Product>> {
    let filter = CategoryFilter::parse(query.category.as_deref());
    let kinds = query
        .kind
        .map_or_else(|| ProductType::ALL.to_vec(), |kind| vec![kind]);

    let needle = search_needle(query.search.as_deref());

    let mut products = Vec::new();
    for kind in kinds {
        products.extend(state.catalog().list_products_by_category(kind, &filter).await);
    }
    if let Some(needle) = needle {
        products.retain(|p| matches_search(p, &needle));
    }
    Json(products)
}

#[instrument(skip(state, admin, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = catalog::create_product(state.store(), admin.as_str(), body).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, admin, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductPatch>,
) -> Result<Json<Product>> {
    let product = catalog::update_product(state.store(), admin.as_str(), &id, body).await?;
    Ok(Json(product))
}

#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode> {
    confirm.require()?;
    catalog::delete_product(state.store(), admin.as_str(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
