//! Flavors of the day.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use gante_core::{Product, ProductId};

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::services::catalog;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FlavorsRequest {
    pub product_ids: Vec<ProductId>,
}

#[derive(Debug, Serialize)]
pub struct FlavorsResponse {
    pub count: usize,
}

#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Json<Vec<Product>> {
    Json(state.catalog().list_flavors_of_the_day().await)
}

/// Replace the whole set. Duplicates collapse; an empty list clears it.
#[instrument(skip(state, admin))]
pub async fn replace(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(body): Json<FlavorsRequest>,
) -> Result<Json<FlavorsResponse>> {
    let count =
        catalog::set_flavors_of_the_day(state.store(), admin.as_str(), body.product_ids).await?;
    Ok(Json(FlavorsResponse { count }))
}
