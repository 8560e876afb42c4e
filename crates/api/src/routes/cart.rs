//! Buyer cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{BuyerId, ProductId};
use event_store::EventStore;
use fulfillment::CartLine;
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub buyer_id: BuyerId,
    pub items: Vec<CartLine>,
}

/// GET /buyers/{buyer_id}/cart
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(buyer_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let buyer_id: BuyerId = parse_id(&buyer_id, "buyer_id")?;
    let items = state.service.cart(buyer_id).await?;
    Ok(Json(CartResponse { buyer_id, items }))
}

/// POST /buyers/{buyer_id}/cart
#[tracing::instrument(skip(state, req))]
pub async fn add<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(buyer_id): Path<String>,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let buyer_id: BuyerId = parse_id(&buyer_id, "buyer_id")?;
    let product_id: ProductId = parse_id(&req.product_id, "product_id")?;

    let items = state
        .service
        .add_to_cart(buyer_id, product_id, req.quantity)
        .await?;
    Ok(Json(CartResponse { buyer_id, items }))
}

/// PUT /buyers/{buyer_id}/cart/{product_id}
#[tracing::instrument(skip(state, req))]
pub async fn set_quantity<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((buyer_id, product_id)): Path<(String, String)>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let buyer_id: BuyerId = parse_id(&buyer_id, "buyer_id")?;
    let product_id: ProductId = parse_id(&product_id, "product_id")?;

    let items = state
        .service
        .set_cart_quantity(buyer_id, product_id, req.quantity)
        .await?;
    Ok(Json(CartResponse { buyer_id, items }))
}

/// DELETE /buyers/{buyer_id}/cart/{product_id}
#[tracing::instrument(skip(state))]
pub async fn remove<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((buyer_id, product_id)): Path<(String, String)>,
) -> Result<Json<CartResponse>, ApiError> {
    let buyer_id: BuyerId = parse_id(&buyer_id, "buyer_id")?;
    let product_id: ProductId = parse_id(&product_id, "product_id")?;

    let items = state.service.remove_from_cart(buyer_id, product_id).await?;
    Ok(Json(CartResponse { buyer_id, items }))
}

/// DELETE /buyers/{buyer_id}/cart
#[tracing::instrument(skip(state))]
pub async fn clear<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(buyer_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let buyer_id: BuyerId = parse_id(&buyer_id, "buyer_id")?;
    state.service.clear_cart(buyer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
