//! Order builder handlers.
//!
//! The order lives in the visitor's session as an [`OrderSession`]. Every
//! handler loads it, applies one change and writes it back within the same
//! request.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use gante_core::message::{self, Checkout, Customer, Fulfillment};
use gante_core::order::OrderSession;
use gante_core::{BoxId, LineItemId, ProductId, ProductType, SizeId, ToppingId};

use crate::error::{AppError, Result};
use crate::models::{Change, Committed, OrderView, session_keys};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SizeRequest {
    pub size_id: SizeId,
}

#[derive(Debug, Deserialize)]
pub struct BoxRequest {
    pub box_id: BoxId,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: u32,
}

/// Checkout form.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub name: String,
    /// `true` for delivery, `false` (default) for pickup at the shop.
    #[serde(default)]
    pub delivery: bool,
    #[serde(default)]
    pub address: Option<String>,
}

impl CheckoutRequest {
    fn into_customer(self) -> Customer {
        let fulfillment = if self.delivery {
            Fulfillment::Delivery {
                address: self.address.unwrap_or_default(),
            }
        } else {
            Fulfillment::Pickup
        };
        Customer {
            name: self.name,
            fulfillment,
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_order(session: &Session, state: &AppState) -> Result<OrderSession> {
    Ok(session
        .get::<OrderSession>(session_keys::ORDER)
        .await?
        .unwrap_or_else(|| OrderSession::new(state.config().policy)))
}

async fn save_order(session: &Session, order: &OrderSession) -> Result<()> {
    session.insert(session_keys::ORDER, order).await?;
    Ok(())
}

fn view(state: &AppState, order: &OrderSession) -> OrderView {
    OrderView::new(order, state.config().message.currency)
}

/// Load, apply `f`, save, and report whether `f` took effect.
async fn change(
    state: &AppState,
    session: &Session,
    f: impl FnOnce(&mut OrderSession) -> bool + Send,
) -> Result<Json<Change>> {
    let mut order = load_order(session, state).await?;
    let accepted = f(&mut order);
    if accepted {
        save_order(session, &order).await?;
    }
    Ok(Json(Change {
        accepted,
        order: view(state, &order),
    }))
}

async fn require_product(state: &AppState, kind: ProductType, id: &ProductId) -> Result<()> {
    match state.catalog().get_product(kind, id).await {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("product {id}"))),
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<OrderView>> {
    let order = load_order(&session, &state).await?;
    Ok(Json(view(&state, &order)))
}

#[instrument(skip(state, session))]
pub async fn select_size(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SizeRequest>,
) -> Result<Json<OrderView>> {
    let size = state
        .catalog()
        .list_sizes()
        .await
        .into_iter()
        .find(|s| s.id == body.size_id)
        .ok_or_else(|| AppError::NotFound(format!("size {}", body.size_id)))?;

    let mut order = load_order(&session, &state).await?;
    order.select_size(size);
    save_order(&session, &order).await?;
    Ok(Json(view(&state, &order)))
}

#[instrument(skip(state, session))]
pub async fn add_flavor(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<Change>> {
    require_product(&state, ProductType::Frozen, &id).await?;
    change(&state, &session, |order| order.add_flavor(id)).await
}

#[instrument(skip(state, session))]
pub async fn remove_flavor(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<Change>> {
    change(&state, &session, |order| order.remove_flavor(&id)).await
}

#[instrument(skip(state, session))]
pub async fn toggle_topping(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ToppingId>,
) -> Result<Json<Change>> {
    let known = state
        .catalog()
        .list_toppings()
        .await
        .iter()
        .any(|t| t.id == id);
    if !known {
        return Err(AppError::NotFound(format!("topping {id}")));
    }
    change(&state, &session, |order| {
        order.toggle_topping(id);
        true
    })
    .await
}

#[instrument(skip(state, session))]
pub async fn set_frozen_quantity(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<QuantityRequest>,
) -> Result<Json<OrderView>> {
    let mut order = load_order(&session, &state).await?;
    order.set_frozen_quantity(body.quantity)?;
    save_order(&session, &order).await?;
    Ok(Json(view(&state, &order)))
}

#[instrument(skip(state, session))]
pub async fn commit_frozen(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Committed>> {
    let snapshot = state.catalog().snapshot(ProductType::Frozen).await;
    let mut order = load_order(&session, &state).await?;
    let item = order.commit_frozen(&snapshot)?;
    save_order(&session, &order).await?;
    info!(line_item_id = %item.id, price = %item.price, "Frozen item committed");
    Ok(Json(Committed {
        item,
        order: view(&state, &order),
    }))
}

#[instrument(skip(state, session))]
pub async fn select_box(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<BoxRequest>,
) -> Result<Json<OrderView>> {
    let packaging = state
        .catalog()
        .list_boxes()
        .await
        .into_iter()
        .find(|b| b.id == body.box_id)
        .ok_or_else(|| AppError::NotFound(format!("box {}", body.box_id)))?;

    let mut order = load_order(&session, &state).await?;
    order.select_box(packaging);
    save_order(&session, &order).await?;
    Ok(Json(view(&state, &order)))
}

#[instrument(skip(state, session))]
pub async fn add_confection(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<Change>> {
    require_product(&state, ProductType::Confection, &id).await?;
    change(&state, &session, |order| order.add_confection(id)).await
}

#[instrument(skip(state, session))]
pub async fn remove_confection(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<Change>> {
    change(&state, &session, |order| order.remove_confection(&id)).await
}

#[instrument(skip(state, session))]
pub async fn set_box_quantity(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<QuantityRequest>,
) -> Result<Json<OrderView>> {
    let mut order = load_order(&session, &state).await?;
    order.set_box_quantity(body.quantity)?;
    save_order(&session, &order).await?;
    Ok(Json(view(&state, &order)))
}

#[instrument(skip(state, session))]
pub async fn commit_confection(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Committed>> {
    let snapshot = state.catalog().snapshot(ProductType::Confection).await;
    let mut order = load_order(&session, &state).await?;
    let item = order.commit_confection(&snapshot)?;
    save_order(&session, &order).await?;
    info!(line_item_id = %item.id, price = %item.price, "Confection item committed");
    Ok(Json(Committed {
        item,
        order: view(&state, &order),
    }))
}

#[instrument(skip(state, session))]
pub async fn add_misc(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<Change>> {
    require_product(&state, ProductType::Misc, &id).await?;
    change(&state, &session, |order| {
        order.add_misc(id);
        true
    })
    .await
}

#[instrument(skip(state, session))]
pub async fn remove_misc(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<Change>> {
    change(&state, &session, |order| order.remove_misc(&id)).await
}

#[instrument(skip(state, session))]
pub async fn commit_misc(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Committed>> {
    let snapshot = state.catalog().snapshot(ProductType::Misc).await;
    let mut order = load_order(&session, &state).await?;
    let item = order.commit_misc(&snapshot)?;
    save_order(&session, &order).await?;
    info!(line_item_id = %item.id, price = %item.price, "Misc item committed");
    Ok(Json(Committed {
        item,
        order: view(&state, &order),
    }))
}

#[instrument(skip(state, session))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<LineItemId>,
) -> Result<Json<OrderView>> {
    let mut order = load_order(&session, &state).await?;
    if !order.remove_item(&id) {
        return Err(AppError::NotFound(format!("line item {id}")));
    }
    save_order(&session, &order).await?;
    Ok(Json(view(&state, &order)))
}

#[instrument(skip(state, session))]
pub async fn reset(State(state): State<AppState>, session: Session) -> Result<Json<OrderView>> {
    let mut order = load_order(&session, &state).await?;
    order.reset();
    save_order(&session, &order).await?;
    Ok(Json(view(&state, &order)))
}

/// Compose the WhatsApp message and link, then start a fresh order.
#[instrument(skip(state, session, body))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<Checkout>> {
    let config = state.config();
    let mut order = load_order(&session, &state).await?;
    let customer = body.into_customer();
    let result = message::checkout(&order, &customer, &config.message, &config.whatsapp_number)?;
    let items = order.items().len();

    order.reset();
    save_order(&session, &order).await?;
    info!(
        items,
        total = %result.total,
        delivery = matches!(customer.fulfillment, Fulfillment::Delivery { .. }),
        "Order checked out"
    );
    Ok(Json(result))
}
