//! Order domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, BuyerId, FarmerId, ItemId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Actor, ItemStatus, LineItem, Money, PaymentMethod};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Checkout converted a cart into this order.
    OrderPlaced(OrderPlacedData),

    /// The owning farmer moved an item one step forward.
    ItemAdvanced(ItemAdvancedData),

    /// An item was cancelled by its buyer or farmer.
    ItemCancelled(ItemCancelledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::ItemAdvanced(_) => "ItemAdvanced",
            OrderEvent::ItemCancelled(_) => "ItemCancelled",
        }
    }
}

/// Data for OrderPlaced event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: AggregateId,
    pub buyer_id: BuyerId,

    /// Line items, all `Pending`.
    pub items: Vec<LineItem>,

    /// Sum of line totals at checkout. Never recomputed.
    pub total_price: Money,

    pub payment_method: PaymentMethod,
    pub delivery_address: String,
    pub placed_at: DateTime<Utc>,
}

/// Data for ItemAdvanced event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAdvancedData {
    pub item_id: ItemId,
    pub from: ItemStatus,
    pub to: ItemStatus,
    pub farmer_id: FarmerId,
    pub at: DateTime<Utc>,
}

/// Data for ItemCancelled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCancelledData {
    pub item_id: ItemId,
    pub from: ItemStatus,
    pub cancelled_by: Actor,
    pub cancelled_at: DateTime<Utc>,
}

impl OrderEvent {
    pub fn order_placed(
        order_id: AggregateId,
        buyer_id: BuyerId,
        items: Vec<LineItem>,
        delivery_address: String,
    ) -> Self {
        let total_price = items.iter().map(LineItem::line_total).sum();
        OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            buyer_id,
            items,
            total_price,
            payment_method: PaymentMethod::CashOnDelivery,
            delivery_address,
            placed_at: Utc::now(),
        })
    }

    pub fn item_advanced(
        item_id: ItemId,
        from: ItemStatus,
        to: ItemStatus,
        farmer_id: FarmerId,
    ) -> Self {
        OrderEvent::ItemAdvanced(ItemAdvancedData {
            item_id,
            from,
            to,
            farmer_id,
            at: Utc::now(),
        })
    }

    pub fn item_cancelled(item_id: ItemId, from: ItemStatus, cancelled_by: Actor) -> Self {
        OrderEvent::ItemCancelled(ItemCancelledData {
            item_id,
            from,
            cancelled_by,
            cancelled_at: Utc::now(),
        })
    }

    /// The line item this event touched, if it targets a single item.
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            OrderEvent::OrderPlaced(_) => None,
            OrderEvent::ItemAdvanced(data) => Some(data.item_id),
            OrderEvent::ItemCancelled(data) => Some(data.item_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::NewLineItem;
    use common::ProductId;

    #[test]
    fn event_types_match_variant_names() {
        let item = ItemId::new();
        assert_eq!(
            OrderEvent::item_advanced(
                item,
                ItemStatus::Pending,
                ItemStatus::Accepted,
                FarmerId::new()
            )
            .event_type(),
            "ItemAdvanced"
        );
        assert_eq!(
            OrderEvent::item_cancelled(item, ItemStatus::Pending, Actor::Buyer(BuyerId::new()))
                .event_type(),
            "ItemCancelled"
        );
    }

    #[test]
    fn order_placed_totals_line_items() {
        let items = vec![
            LineItem::pending(
                ItemId::new(),
                NewLineItem::new(ProductId::new(), "A", FarmerId::new(), 2, Money::from_minor(50)),
            ),
            LineItem::pending(
                ItemId::new(),
                NewLineItem::new(ProductId::new(), "B", FarmerId::new(), 1, Money::from_minor(30)),
            ),
        ];

        let event = OrderEvent::order_placed(
            AggregateId::new(),
            BuyerId::new(),
            items,
            "12 Farm Rd".into(),
        );
        let OrderEvent::OrderPlaced(data) = event else {
            panic!("expected OrderPlaced");
        };
        assert_eq!(data.total_price.minor(), 130);
        assert_eq!(data.payment_method, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn serialized_with_type_and_data() {
        let event = OrderEvent::item_cancelled(
            ItemId::new(),
            ItemStatus::Accepted,
            Actor::Farmer(FarmerId::new()),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ItemCancelled");
        assert_eq!(json["data"]["from"], "Accepted");
        assert_eq!(json["data"]["cancelled_by"]["role"], "farmer");

        let back: OrderEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.item_id(), event.item_id());
    }
}
