//! Category management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use gante_catalog::{CategoryPatch, NewCategory};
use gante_core::{Category, CategoryId, ProductType};

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::routes::ConfirmQuery;
use crate::services::catalog;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(default, rename = "type")]
    pub kind: Option<ProductType>,
}

#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<CategoryQuery>,
) -> Json<Vec<Category>> {
    let kinds = query
        .kind
        .map_or_else(|| ProductType::ALL.to_vec(), |kind| vec![kind]);

    let mut categories = Vec::new();
    for kind in kinds {
        categories.extend(state.catalog().list_categories(kind).await);
    }
    Json(categories)
}

#[instrument(skip(state, admin, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(body): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = catalog::create_category(state.store(), admin.as_str(), body).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, admin, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryPatch>,
) -> Result<Json<Category>> {
    let category = catalog::update_category(state.store(), admin.as_str(), &id, body).await?;
    Ok(Json(category))
}

/// Products in the category keep their dangling reference.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode> {
    confirm.require()?;
    catalog::delete_category(state.store(), admin.as_str(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
