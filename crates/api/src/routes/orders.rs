//! Checkout, order query and item status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{AggregateId, BuyerId, FarmerId, ItemId, ProductId};
use domain::{Actor, Aggregate, ItemStatus, LineItem, Order, OrderStatus, PaymentMethod};
use event_store::EventStore;
use fulfillment::FarmerOrderView;
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub delivery_address: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct CancelItemRequest {
    pub actor: Actor,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Option<AggregateId>,
    pub reference: Option<String>,
    pub buyer_id: Option<BuyerId>,
    pub status: OrderStatus,
    pub items: Vec<ItemResponse>,
    pub total_price: i64,
    pub payment_method: PaymentMethod,
    pub delivery_address: String,
    pub placed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item_id: ItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub farmer_id: FarmerId,
    pub quantity: u32,
    pub unit_price: i64,
    pub status: ItemStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<&LineItem> for ItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            item_id: item.item_id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            farmer_id: item.farmer_id,
            quantity: item.quantity,
            unit_price: item.unit_price.minor(),
            status: item.status,
            cancelled_at: item.cancelled_at,
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            reference: order.id().map(|id| id.short_ref()),
            buyer_id: order.buyer_id(),
            status: order.status(),
            items: order.items().iter().map(ItemResponse::from).collect(),
            total_price: order.total_price().minor(),
            payment_method: order.payment_method(),
            delivery_address: order.delivery_address().to_string(),
            placed_at: order.placed_at(),
            updated_at: order.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /buyers/{buyer_id}/orders: check out the buyer's cart.
#[tracing::instrument(skip(state, req))]
pub async fn place<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(buyer_id): Path<String>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let buyer_id: BuyerId = parse_id(&buyer_id, "buyer_id")?;
    let order = state
        .service
        .place_order(buyer_id, &req.delivery_address)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /buyers/{buyer_id}/orders
#[tracing::instrument(skip(state))]
pub async fn for_buyer<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(buyer_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let buyer_id: BuyerId = parse_id(&buyer_id, "buyer_id")?;
    let orders = state.service.orders_for_buyer(buyer_id).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /farmers/{farmer_id}/orders
#[tracing::instrument(skip(state))]
pub async fn for_farmer<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(farmer_id): Path<String>,
) -> Result<Json<Vec<FarmerOrderView>>, ApiError> {
    let farmer_id: FarmerId = parse_id(&farmer_id, "farmer_id")?;
    Ok(Json(state.service.orders_for_farmer(farmer_id).await?))
}

/// GET /orders/{order_id}
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: AggregateId = parse_id(&order_id, "order_id")?;
    let order = state.service.get_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /orders/{order_id}/items/{item_id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((order_id, item_id)): Path<(String, String)>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: AggregateId = parse_id(&order_id, "order_id")?;
    let item_id: ItemId = parse_id(&item_id, "item_id")?;

    let order = state
        .service
        .update_item_status(order_id, item_id, &req.status, req.actor)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/{order_id}/items/{item_id}/cancel
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((order_id, item_id)): Path<(String, String)>,
    Json(req): Json<CancelItemRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: AggregateId = parse_id(&order_id, "order_id")?;
    let item_id: ItemId = parse_id(&item_id, "item_id")?;

    let order = state.service.cancel_item(order_id, item_id, req.actor).await?;
    Ok(Json(OrderResponse::from(&order)))
}
