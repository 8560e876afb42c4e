//! Order commands.

use common::{AggregateId, BuyerId, ItemId};

use crate::command::Command;

use super::{Actor, ItemStatus, NewLineItem, Order};

/// Command to place a new order from resolved cart lines.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub order_id: AggregateId,
    pub buyer_id: BuyerId,
    pub lines: Vec<NewLineItem>,
    pub delivery_address: String,
}

impl PlaceOrder {
    /// Creates a PlaceOrder command with a generated order ID.
    pub fn new(
        buyer_id: BuyerId,
        lines: Vec<NewLineItem>,
        delivery_address: impl Into<String>,
    ) -> Self {
        Self {
            order_id: AggregateId::new(),
            buyer_id,
            lines,
            delivery_address: delivery_address.into(),
        }
    }
}

impl Command for PlaceOrder {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to change one line item's status.
#[derive(Debug, Clone)]
pub struct UpdateItemStatus {
    pub order_id: AggregateId,
    pub item_id: ItemId,
    pub status: ItemStatus,
    pub actor: Actor,
}

impl UpdateItemStatus {
    pub fn new(order_id: AggregateId, item_id: ItemId, status: ItemStatus, actor: Actor) -> Self {
        Self {
            order_id,
            item_id,
            status,
            actor,
        }
    }
}

impl Command for UpdateItemStatus {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}

/// Command to cancel one line item.
#[derive(Debug, Clone)]
pub struct CancelItem {
    pub order_id: AggregateId,
    pub item_id: ItemId,
    pub actor: Actor,
}

impl CancelItem {
    pub fn new(order_id: AggregateId, item_id: ItemId, actor: Actor) -> Self {
        Self {
            order_id,
            item_id,
            actor,
        }
    }
}

impl Command for CancelItem {
    type Aggregate = Order;

    fn aggregate_id(&self) -> AggregateId {
        self.order_id
    }
}
