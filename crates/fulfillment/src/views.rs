//! Query results shaped for one reader.

use chrono::{DateTime, Utc};
use common::{AggregateId, BuyerId, FarmerId};
use domain::{Aggregate, LineItem, Money, Order, OrderStatus};
use serde::{Deserialize, Serialize};

/// An order as one farmer sees it: only their own lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerOrderView {
    pub order_id: AggregateId,
    pub buyer_id: BuyerId,
    pub order_status: OrderStatus,
    pub delivery_address: String,
    pub placed_at: Option<DateTime<Utc>>,
    pub items: Vec<LineItem>,
    /// Sum of this farmer's lines, cancelled ones included.
    pub farmer_total: Money,
}

impl FarmerOrderView {
    /// None when the farmer has no lines in the order.
    pub fn for_farmer(order: &Order, farmer_id: FarmerId) -> Option<Self> {
        let items: Vec<LineItem> = order.items_for_farmer(farmer_id).cloned().collect();
        if items.is_empty() {
            return None;
        }

        Some(Self {
            order_id: order.id()?,
            buyer_id: order.buyer_id()?,
            order_status: order.status(),
            delivery_address: order.delivery_address().to_string(),
            placed_at: order.placed_at(),
            farmer_total: items.iter().map(LineItem::line_total).sum(),
            items,
        })
    }
}
