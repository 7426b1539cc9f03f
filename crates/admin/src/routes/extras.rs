//! Sizes, boxes and toppings.
//!
//! These carry caller-chosen ids. `POST` takes the id from the body; `PUT`
//! takes it from the path and rejects a body id that disagrees. Both save
//! the whole record, creating it if it does not exist.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use gante_core::{BoxId, BoxOption, SizeId, SizeOption, Topping, ToppingId};

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::routes::ConfirmQuery;
use crate::services::catalog::{
    self, ToppingInput, UnitOptionInput, box_from_input, size_from_input, topping_from_input,
};
use crate::state::AppState;

// =============================================================================
// Sizes
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn list_sizes(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Json<Vec<SizeOption>> {
    Json(state.catalog().list_sizes().await)
}

#[instrument(skip(state, admin, body))]
pub async fn create_size(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(body): Json<UnitOptionInput>,
) -> Result<(StatusCode, Json<SizeOption>)> {
    let size = size_from_input(None, body)?;
    let size = catalog::save_size(state.store(), admin.as_str(), size).await?;
    Ok((StatusCode::CREATED, Json(size)))
}

#[instrument(skip(state, admin, body))]
pub async fn replace_size(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<SizeId>,
    Json(body): Json<UnitOptionInput>,
) -> Result<Json<SizeOption>> {
    let size = size_from_input(Some(id.as_str()), body)?;
    Ok(Json(
        catalog::save_size(state.store(), admin.as_str(), size).await?,
    ))
}

#[instrument(skip(state, admin))]
pub async fn delete_size(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<SizeId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode> {
    confirm.require()?;
    catalog::delete_size(state.store(), admin.as_str(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Boxes
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn list_boxes(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Json<Vec<BoxOption>> {
    Json(state.catalog().list_boxes().await)
}

#[instrument(skip(state, admin, body))]
pub async fn create_box(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(body): Json<UnitOptionInput>,
) -> Result<(StatusCode, Json<BoxOption>)> {
    let packaging = box_from_input(None, body)?;
    let packaging = catalog::save_box(state.store(), admin.as_str(), packaging).await?;
    Ok((StatusCode::CREATED, Json(packaging)))
}

#[instrument(skip(state, admin, body))]
pub async fn replace_box(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<BoxId>,
    Json(body): Json<UnitOptionInput>,
) -> Result<Json<BoxOption>> {
    let packaging = box_from_input(Some(id.as_str()), body)?;
    Ok(Json(
        catalog::save_box(state.store(), admin.as_str(), packaging).await?,
    ))
}

#[instrument(skip(state, admin))]
pub async fn delete_box(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<BoxId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode> {
    confirm.require()?;
    catalog::delete_box(state.store(), admin.as_str(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Toppings
// =============================================================================

#[instrument(skip(state, _admin))]
pub async fn list_toppings(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Json<Vec<Topping>> {
    Json(state.catalog().list_toppings().await)
}

#[instrument(skip(state, admin, body))]
pub async fn create_topping(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(body): Json<ToppingInput>,
) -> Result<(StatusCode, Json<Topping>)> {
    let topping = topping_from_input(None, body)?;
    let topping = catalog::save_topping(state.store(), admin.as_str(), topping).await?;
    Ok((StatusCode::CREATED, Json(topping)))
}

#[instrument(skip(state, admin, body))]
pub async fn replace_topping(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ToppingId>,
    Json(body): Json<ToppingInput>,
) -> Result<Json<Topping>> {
    let topping = topping_from_input(Some(id.as_str()), body)?;
    Ok(Json(
        catalog::save_topping(state.store(), admin.as_str(), topping).await?,
    ))
}

#[instrument(skip(state, admin))]
pub async fn delete_topping(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ToppingId>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode> {
    confirm.require()?;
    catalog::delete_topping(state.store(), admin.as_str(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
