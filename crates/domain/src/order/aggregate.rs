//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, BuyerId, FarmerId, ItemId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    Actor, ItemStatus, LineItem, Money, NewLineItem, OrderError, OrderEvent, OrderStatus,
    PaymentMethod,
    events::{ItemAdvancedData, ItemCancelledData, OrderPlacedData},
};

/// Order aggregate root.
///
/// A multi-vendor purchase record. Item membership, prices and the total are
/// fixed at checkout; afterwards only line-item statuses change, and the
/// order status is re-derived from them after every change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    buyer_id: Option<BuyerId>,

    /// Line items in checkout order.
    items: Vec<LineItem>,

    total_price: Money,
    payment_method: PaymentMethod,
    delivery_address: String,
    status: OrderStatus,
    placed_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced(data) => self.apply_order_placed(data),
            OrderEvent::ItemAdvanced(data) => self.apply_item_advanced(data),
            OrderEvent::ItemCancelled(data) => self.apply_item_cancelled(data),
        }
        self.status = OrderStatus::derive(self.items.iter().map(|item| item.status));
    }
}

// Query methods
impl Order {
    pub fn buyer_id(&self) -> Option<BuyerId> {
        self.buyer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item(&self, item_id: ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.item_id == item_id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total charged at checkout. Unaffected by later cancellations.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Distinct farmers in the order, in the order they first appear.
    pub fn farmer_ids(&self) -> Vec<FarmerId> {
        let mut farmers = Vec::new();
        for item in &self.items {
            if !farmers.contains(&item.farmer_id) {
                farmers.push(item.farmer_id);
            }
        }
        farmers
    }

    pub fn items_for_farmer(&self, farmer_id: FarmerId) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(move |item| item.is_owned_by(farmer_id))
    }

    pub fn is_placed(&self) -> bool {
        self.id.is_some()
    }
}

// Command methods (return events)
impl Order {
    /// Places a new order from resolved cart lines.
    pub fn place(
        &self,
        order_id: AggregateId,
        buyer_id: BuyerId,
        lines: Vec<NewLineItem>,
        delivery_address: impl Into<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }

        if lines.is_empty() {
            return Err(OrderError::NoItems);
        }

        let delivery_address = delivery_address.into().trim().to_string();
        if delivery_address.is_empty() {
            return Err(OrderError::MissingAddress);
        }

        for line in &lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: line.quantity,
                });
            }
            if line.unit_price.is_negative() {
                return Err(OrderError::InvalidPrice {
                    product_id: line.product_id,
                    price: line.unit_price.minor(),
                });
            }
        }

        let items = lines
            .into_iter()
            .map(|line| LineItem::pending(ItemId::new(), line))
            .collect();

        Ok(vec![OrderEvent::order_placed(
            order_id,
            buyer_id,
            items,
            delivery_address,
        )])
    }

    /// Requests a status change on one item.
    ///
    /// A `Cancelled` target is handled as [`Order::cancel_item`]; anything
    /// else must be the next forward step, requested by the owning farmer.
    pub fn update_item_status(
        &self,
        item_id: ItemId,
        target: ItemStatus,
        actor: Actor,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if target == ItemStatus::Cancelled {
            return self.cancel_item(item_id, actor);
        }
        self.advance_item(item_id, target, actor)
    }

    /// Moves an item one step along `Pending -> Accepted -> Shipped -> Delivered`.
    pub fn advance_item(
        &self,
        item_id: ItemId,
        target: ItemStatus,
        actor: Actor,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let item = self.find_item(item_id)?;

        let farmer_id = match actor {
            Actor::Farmer(farmer_id) if item.is_owned_by(farmer_id) => farmer_id,
            _ => return Err(OrderError::Unauthorized { actor, item_id }),
        };

        item.status.check_advance(target)?;

        Ok(vec![OrderEvent::item_advanced(
            item_id,
            item.status,
            target,
            farmer_id,
        )])
    }

    /// Cancels an item that has not shipped yet.
    ///
    /// Allowed for the order's buyer and for the item's farmer.
    pub fn cancel_item(
        &self,
        item_id: ItemId,
        actor: Actor,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let item = self.find_item(item_id)?;

        let allowed = match actor {
            Actor::Buyer(buyer_id) => self.buyer_id == Some(buyer_id),
            Actor::Farmer(farmer_id) => item.is_owned_by(farmer_id),
        };
        if !allowed {
            return Err(OrderError::Unauthorized { actor, item_id });
        }

        item.status.check_cancel()?;

        Ok(vec![OrderEvent::item_cancelled(item_id, item.status, actor)])
    }

    fn find_item(&self, item_id: ItemId) -> Result<&LineItem, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        self.item(item_id)
            .ok_or(OrderError::ItemNotFound { item_id })
    }
}

// Apply event helpers
impl Order {
    fn apply_order_placed(&mut self, data: OrderPlacedData) {
        self.id = Some(data.order_id);
        self.buyer_id = Some(data.buyer_id);
        self.items = data.items;
        self.total_price = data.total_price;
        self.payment_method = data.payment_method;
        self.delivery_address = data.delivery_address;
        self.placed_at = Some(data.placed_at);
        self.updated_at = Some(data.placed_at);
    }

    fn apply_item_advanced(&mut self, data: ItemAdvancedData) {
        if let Some(item) = self.items.iter_mut().find(|i| i.item_id == data.item_id) {
            item.status = data.to;
        }
        self.updated_at = Some(data.at);
    }

    fn apply_item_cancelled(&mut self, data: ItemCancelledData) {
        if let Some(item) = self.items.iter_mut().find(|i| i.item_id == data.item_id) {
            item.status = ItemStatus::Cancelled;
            item.cancelled_at.get_or_insert(data.cancelled_at);
        }
        self.updated_at = Some(data.cancelled_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregate, DomainEvent};
    use common::ProductId;

    struct Fixture {
        order: Order,
        buyer: BuyerId,
        f1: FarmerId,
        f2: FarmerId,
        item_a: ItemId,
        item_b: ItemId,
    }

    fn placed_order() -> Fixture {
        let buyer = BuyerId::new();
        let f1 = FarmerId::new();
        let f2 = FarmerId::new();
        let lines = vec![
            NewLineItem::new(ProductId::new(), "Apples", f1, 2, Money::from_minor(50)),
            NewLineItem::new(ProductId::new(), "Beans", f2, 1, Money::from_minor(30)),
        ];

        let mut order = Order::default();
        let events = order
            .place(AggregateId::new(), buyer, lines, "12 Orchard Lane")
            .unwrap();
        order.apply_events(events);

        let item_a = order.items()[0].item_id;
        let item_b = order.items()[1].item_id;
        Fixture {
            order,
            buyer,
            f1,
            f2,
            item_a,
            item_b,
        }
    }

    fn run(order: &mut Order, events: Result<Vec<OrderEvent>, OrderError>) {
        order.apply_events(events.unwrap());
    }

    #[test]
    fn place_creates_pending_order_with_total() {
        let fx = placed_order();
        assert!(fx.order.is_placed());
        assert_eq!(fx.order.buyer_id(), Some(fx.buyer));
        assert_eq!(fx.order.status(), OrderStatus::Pending);
        assert_eq!(fx.order.total_price().minor(), 130);
        assert_eq!(fx.order.payment_method(), PaymentMethod::CashOnDelivery);
        assert_eq!(fx.order.delivery_address(), "12 Orchard Lane");
        assert!(fx.order.items().iter().all(|i| i.status == ItemStatus::Pending));
        assert_eq!(fx.order.farmer_ids(), vec![fx.f1, fx.f2]);
        assert!(fx.order.placed_at().is_some());
    }

    #[test]
    fn place_twice_fails() {
        let fx = placed_order();
        let result = fx.order.place(
            AggregateId::new(),
            fx.buyer,
            vec![NewLineItem::new(ProductId::new(), "X", fx.f1, 1, Money::zero())],
            "addr",
        );
        assert!(matches!(result, Err(OrderError::AlreadyPlaced)));
    }

    #[test]
    fn place_validates_input() {
        let order = Order::default();
        let farmer = FarmerId::new();
        let buyer = BuyerId::new();

        assert!(matches!(
            order.place(AggregateId::new(), buyer, vec![], "addr"),
            Err(OrderError::NoItems)
        ));
        assert!(matches!(
            order.place(
                AggregateId::new(),
                buyer,
                vec![NewLineItem::new(ProductId::new(), "X", farmer, 0, Money::zero())],
                "addr"
            ),
            Err(OrderError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(matches!(
            order.place(
                AggregateId::new(),
                buyer,
                vec![NewLineItem::new(ProductId::new(), "X", farmer, 1, Money::from_minor(-1))],
                "addr"
            ),
            Err(OrderError::InvalidPrice { price: -1, .. })
        ));
        assert!(matches!(
            order.place(
                AggregateId::new(),
                buyer,
                vec![NewLineItem::new(ProductId::new(), "X", farmer, 1, Money::zero())],
                "   "
            ),
            Err(OrderError::MissingAddress)
        ));
    }

    #[test]
    fn farmer_walks_item_forward_and_status_follows() {
        let mut fx = placed_order();
        let f1 = Actor::Farmer(fx.f1);

        let events = fx.order.advance_item(fx.item_a, ItemStatus::Accepted, f1);
        run(&mut fx.order, events);
        assert_eq!(fx.order.status(), OrderStatus::Accepted);

        let events = fx.order.advance_item(fx.item_a, ItemStatus::Shipped, f1);
        run(&mut fx.order, events);
        assert_eq!(fx.order.status(), OrderStatus::Shipped);
        assert_eq!(fx.order.item(fx.item_b).unwrap().status, ItemStatus::Pending);
    }

    #[test]
    fn shipped_item_is_delivered_by_its_farmer() {
        let mut fx = placed_order();
        for (item, farmer) in [(fx.item_a, fx.f1), (fx.item_b, fx.f2)] {
            for target in [ItemStatus::Accepted, ItemStatus::Shipped] {
                let events = fx.order.advance_item(item, target, Actor::Farmer(farmer));
                run(&mut fx.order, events);
            }
        }

        assert!(matches!(
            fx.order
                .advance_item(fx.item_a, ItemStatus::Delivered, Actor::Farmer(fx.f2)),
            Err(OrderError::Unauthorized { .. })
        ));
        assert!(matches!(
            fx.order.cancel_item(fx.item_a, Actor::Buyer(fx.buyer)),
            Err(OrderError::InvalidTransition {
                from: ItemStatus::Shipped,
                to: ItemStatus::Cancelled
            })
        ));

        let events = fx
            .order
            .advance_item(fx.item_a, ItemStatus::Delivered, Actor::Farmer(fx.f1));
        run(&mut fx.order, events);
        assert_eq!(fx.order.item(fx.item_a).unwrap().status, ItemStatus::Delivered);
        assert_eq!(fx.order.status(), OrderStatus::Shipped);

        let events = fx
            .order
            .advance_item(fx.item_b, ItemStatus::Delivered, Actor::Farmer(fx.f2));
        run(&mut fx.order, events);
        assert_eq!(fx.order.status(), OrderStatus::Delivered);

        assert!(
            fx.order
                .advance_item(fx.item_b, ItemStatus::Delivered, Actor::Farmer(fx.f2))
                .is_err()
        );
    }

    #[test]
    fn skipping_a_state_is_invalid() {
        let fx = placed_order();
        let result = fx
            .order
            .advance_item(fx.item_a, ItemStatus::Shipped, Actor::Farmer(fx.f1));
        assert!(matches!(
            result,
            Err(OrderError::InvalidTransition {
                from: ItemStatus::Pending,
                to: ItemStatus::Shipped
            })
        ));
    }

    #[test]
    fn only_owning_farmer_may_advance() {
        let fx = placed_order();
        for actor in [Actor::Farmer(fx.f2), Actor::Buyer(fx.buyer)] {
            let result = fx.order.advance_item(fx.item_a, ItemStatus::Accepted, actor);
            assert!(matches!(result, Err(OrderError::Unauthorized { .. })), "{actor}");
        }
    }

    #[test]
    fn buyer_or_owning_farmer_may_cancel() {
        let fx = placed_order();
        assert!(fx.order.cancel_item(fx.item_b, Actor::Buyer(fx.buyer)).is_ok());
        assert!(fx.order.cancel_item(fx.item_b, Actor::Farmer(fx.f2)).is_ok());
        assert!(matches!(
            fx.order.cancel_item(fx.item_b, Actor::Farmer(fx.f1)),
            Err(OrderError::Unauthorized { .. })
        ));
        assert!(matches!(
            fx.order.cancel_item(fx.item_b, Actor::Buyer(BuyerId::new())),
            Err(OrderError::Unauthorized { .. })
        ));
    }

    #[test]
    fn cancel_stamps_time_and_keeps_total() {
        let mut fx = placed_order();
        let events = fx.order.cancel_item(fx.item_b, Actor::Buyer(fx.buyer));
        run(&mut fx.order, events);

        let item = fx.order.item(fx.item_b).unwrap();
        assert_eq!(item.status, ItemStatus::Cancelled);
        assert!(item.cancelled_at.is_some());
        assert_eq!(fx.order.total_price().minor(), 130);
        assert_eq!(fx.order.status(), OrderStatus::Pending);
    }

    #[test]
    fn cancel_rejected_once_shipped_or_cancelled() {
        let mut fx = placed_order();
        let f1 = Actor::Farmer(fx.f1);
        for target in [ItemStatus::Accepted, ItemStatus::Shipped] {
            let events = fx.order.advance_item(fx.item_a, target, f1);
            run(&mut fx.order, events);
        }
        assert!(matches!(
            fx.order.cancel_item(fx.item_a, Actor::Buyer(fx.buyer)),
            Err(OrderError::InvalidTransition {
                from: ItemStatus::Shipped,
                to: ItemStatus::Cancelled
            })
        ));

        let events = fx.order.cancel_item(fx.item_b, Actor::Buyer(fx.buyer));
        run(&mut fx.order, events);
        assert!(fx.order.cancel_item(fx.item_b, Actor::Buyer(fx.buyer)).is_err());
    }

    #[test]
    fn update_item_status_routes_cancelled_to_cancel() {
        let fx = placed_order();
        let events = fx
            .order
            .update_item_status(fx.item_b, ItemStatus::Cancelled, Actor::Buyer(fx.buyer))
            .unwrap();
        assert_eq!(events[0].event_type(), "ItemCancelled");

        assert!(matches!(
            fx.order
                .update_item_status(fx.item_a, ItemStatus::Pending, Actor::Farmer(fx.f1)),
            Err(OrderError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn scenario_shipped_dominates_after_cancel() {
        let mut fx = placed_order();
        let f1 = Actor::Farmer(fx.f1);
        for target in [ItemStatus::Accepted, ItemStatus::Shipped] {
            let events = fx.order.advance_item(fx.item_a, target, f1);
            run(&mut fx.order, events);
        }
        let events = fx.order.cancel_item(fx.item_b, Actor::Buyer(fx.buyer));
        run(&mut fx.order, events);

        assert_eq!(fx.order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn all_cancelled_cancels_order() {
        let mut fx = placed_order();
        for item in [fx.item_a, fx.item_b] {
            let events = fx.order.cancel_item(item, Actor::Buyer(fx.buyer));
            run(&mut fx.order, events);
        }
        assert_eq!(fx.order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn unknown_item_or_unplaced_order() {
        let fx = placed_order();
        assert!(matches!(
            fx.order.cancel_item(ItemId::new(), Actor::Buyer(fx.buyer)),
            Err(OrderError::ItemNotFound { .. })
        ));
        assert!(matches!(
            Order::default().cancel_item(fx.item_a, Actor::Buyer(fx.buyer)),
            Err(OrderError::NotPlaced)
        ));
    }

    #[test]
    fn replaying_events_rebuilds_same_state() {
        let mut fx = placed_order();
        let placed = OrderEvent::OrderPlaced(OrderPlacedData {
            order_id: fx.order.id().unwrap(),
            buyer_id: fx.buyer,
            items: fx.order.items().to_vec(),
            total_price: fx.order.total_price(),
            payment_method: fx.order.payment_method(),
            delivery_address: fx.order.delivery_address().to_string(),
            placed_at: fx.order.placed_at().unwrap(),
        });
        let advanced = fx
            .order
            .advance_item(fx.item_a, ItemStatus::Accepted, Actor::Farmer(fx.f1))
            .unwrap();
        fx.order.apply_events(advanced.clone());

        let mut rebuilt = Order::default();
        rebuilt.apply_events(std::iter::once(placed).chain(advanced));

        assert_eq!(rebuilt.status(), fx.order.status());
        assert_eq!(rebuilt.items(), fx.order.items());
    }
}
