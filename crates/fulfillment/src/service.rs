//! The fulfillment service: checkout, item updates and order queries.

use std::sync::Arc;

use common::{AggregateId, BuyerId, FarmerId, ItemId, ProductId};
use domain::{
    Actor, CancelItem, DEFAULT_MAX_WRITE_RETRIES, ItemStatus, NewLineItem, Order, OrderService,
    PlaceOrder, UpdateItemStatus,
};
use event_store::EventStore;
use projections::{OrderDirectoryView, ProjectionProcessor};

use crate::error::{FulfillmentError, Result};
use crate::fanout::NotificationFanout;
use crate::services::{CartLine, CartStore, Catalog, Notifier, StockLine};
use crate::views::FarmerOrderView;

/// The stores and channels the service talks to besides the event store.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub carts: Arc<dyn CartStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// Orchestrates orders for buyers and farmers.
///
/// Checkout checks every cart line against the catalog, takes all stock in
/// one batch, then persists the order. If persisting fails the stock is put
/// back. Item changes retry on version conflicts, so concurrent updates to
/// different items of one order both land.
pub struct FulfillmentService<S: EventStore + Clone> {
    orders: OrderService<S>,
    processor: ProjectionProcessor<S>,
    directory: OrderDirectoryView,
    catalog: Arc<dyn Catalog>,
    carts: Arc<dyn CartStore>,
    fanout: NotificationFanout,
}

impl<S: EventStore + Clone> FulfillmentService<S> {
    pub fn new(store: S, collaborators: Collaborators) -> Self {
        Self::with_max_write_retries(store, collaborators, DEFAULT_MAX_WRITE_RETRIES)
    }

    pub fn with_max_write_retries(
        store: S,
        collaborators: Collaborators,
        max_write_retries: u32,
    ) -> Self {
        let directory = OrderDirectoryView::new();
        let mut processor = ProjectionProcessor::new(store.clone());
        processor.register(Arc::new(directory.clone()));

        Self {
            orders: OrderService::with_max_write_retries(store, max_write_retries),
            processor,
            directory,
            catalog: collaborators.catalog,
            carts: collaborators.carts,
            fanout: NotificationFanout::new(collaborators.notifier),
        }
    }

    pub fn store(&self) -> &S {
        self.orders.store()
    }

    // ---- cart ----

    pub async fn cart(&self, buyer_id: BuyerId) -> Result<Vec<CartLine>> {
        Ok(self.carts.get_cart(buyer_id).await?)
    }

    /// Adds a catalog product to the buyer's cart. Stock is not reserved.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLine>> {
        if self.catalog.get_product(product_id).await?.is_none() {
            return Err(FulfillmentError::NotFound(format!("product {product_id}")));
        }
        Ok(self.carts.add_item(buyer_id, product_id, quantity).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_cart_quantity(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLine>> {
        Ok(self.carts.set_quantity(buyer_id, product_id, quantity).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<Vec<CartLine>> {
        Ok(self.carts.remove_item(buyer_id, product_id).await?)
    }

    pub async fn clear_cart(&self, buyer_id: BuyerId) -> Result<()> {
        Ok(self.carts.clear_cart(buyer_id).await?)
    }

    // ---- checkout ----

    /// Turns the buyer's cart into an order.
    ///
    /// Nothing is decremented unless every line passes validation, and the
    /// batch decrement itself is all-or-nothing.
    #[tracing::instrument(skip(self, delivery_address))]
    pub async fn place_order(&self, buyer_id: BuyerId, delivery_address: &str) -> Result<Order> {
        match self.checkout(buyer_id, delivery_address).await {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                self.fanout.order_placed(&order).await;
                Ok(order)
            }
            Err(e) => {
                metrics::counter!("checkout_rejected_total", "reason" => e.kind()).increment(1);
                tracing::info!(%buyer_id, error = %e, "checkout rejected");
                Err(e)
            }
        }
    }

    async fn checkout(&self, buyer_id: BuyerId, delivery_address: &str) -> Result<Order> {
        let delivery_address = delivery_address.trim();
        if delivery_address.is_empty() {
            return Err(FulfillmentError::Validation("delivery address is required".to_string()));
        }

        let cart = self.carts.get_cart(buyer_id).await?;
        if cart.is_empty() {
            return Err(FulfillmentError::Validation("cart is empty".to_string()));
        }

        let mut lines = Vec::with_capacity(cart.len());
        let mut stock = Vec::with_capacity(cart.len());
        for entry in &cart {
            let product = self
                .catalog
                .get_product(entry.product_id)
                .await?
                .ok_or_else(|| {
                    FulfillmentError::NotFound(format!("product {}", entry.product_id))
                })?;

            if product.available < entry.quantity {
                return Err(FulfillmentError::InsufficientStock {
                    product_id: product.product_id,
                    available: product.available,
                    requested: entry.quantity,
                });
            }

            stock.push(StockLine::new(product.product_id, entry.quantity));
            lines.push(NewLineItem::new(
                product.product_id,
                product.name,
                product.farmer_id,
                entry.quantity,
                product.price,
            ));
        }

        self.catalog.decrement_stock_batch(&stock).await?;

        let order = match self
            .orders
            .place_order(PlaceOrder::new(buyer_id, lines, delivery_address))
            .await
        {
            Ok(result) => result.aggregate,
            Err(e) => {
                self.restock(&stock).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.carts.remove_ordered(buyer_id, &cart).await {
            tracing::warn!(%buyer_id, error = %e, "order placed but cart could not be cleared");
        }

        Ok(order)
    }

    async fn restock(&self, stock: &[StockLine]) {
        match self.catalog.restock_batch(stock).await {
            Ok(()) => tracing::info!(lines = stock.len(), "stock restored after failed checkout"),
            Err(e) => tracing::error!(lines = stock.len(), error = %e, "failed to restore stock"),
        }
    }

    // ---- item changes ----

    /// Applies a status change named by string. `Cancelled` cancels the item.
    #[tracing::instrument(skip(self))]
    pub async fn update_item_status(
        &self,
        order_id: AggregateId,
        item_id: ItemId,
        status: &str,
        actor: Actor,
    ) -> Result<Order> {
        let target: ItemStatus = status.parse()?;
        let result = self
            .orders
            .update_item_status(UpdateItemStatus::new(order_id, item_id, target, actor))
            .await?;

        self.item_changed(&result.aggregate, item_id, actor).await;
        Ok(result.aggregate)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel_item(
        &self,
        order_id: AggregateId,
        item_id: ItemId,
        actor: Actor,
    ) -> Result<Order> {
        let result = self
            .orders
            .cancel_item(CancelItem::new(order_id, item_id, actor))
            .await?;

        self.item_changed(&result.aggregate, item_id, actor).await;
        Ok(result.aggregate)
    }

    async fn item_changed(&self, order: &Order, item_id: ItemId, actor: Actor) {
        if let Some(item) = order.item(item_id) {
            metrics::counter!("order_item_transitions_total", "to" => item.status.as_str())
                .increment(1);
        }
        self.fanout.item_changed(order, item_id, actor).await;
    }

    // ---- queries ----

    pub async fn get_order(&self, order_id: AggregateId) -> Result<Order> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or_else(|| FulfillmentError::NotFound(format!("order {order_id}")))
    }

    /// The buyer's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>> {
        self.processor.run_catch_up().await?;
        let ids = self.directory.orders_for_buyer(buyer_id).await;
        self.load_all(ids).await
    }

    /// Orders holding at least one of the farmer's items, newest first,
    /// each trimmed to that farmer's lines.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_farmer(&self, farmer_id: FarmerId) -> Result<Vec<FarmerOrderView>> {
        self.processor.run_catch_up().await?;
        let ids = self.directory.orders_for_farmer(farmer_id).await;
        let orders = self.load_all(ids).await?;

        Ok(orders
            .iter()
            .filter_map(|order| FarmerOrderView::for_farmer(order, farmer_id))
            .collect())
    }

    async fn load_all(&self, ids: Vec<AggregateId>) -> Result<Vec<Order>> {
        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(order) = self.orders.get_order(id).await? {
                orders.push(order);
            }
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::{EmailPayload, EmailTemplate};
    use crate::services::{
        CartError, InMemoryCartStore, InMemoryCatalog, NotifyError, ProductSnapshot, Recipient,
    };
    use crate::session::OrderUpdate;
    use async_trait::async_trait;
    use domain::{Aggregate, Money, OrderStatus};
    use event_store::InMemoryEventStore;

    struct Silent;

    #[async_trait]
    impl Notifier for Silent {
        async fn push_to_session(&self, _buyer_id: BuyerId, _update: OrderUpdate) -> usize {
            0
        }

        async fn send_email(
            &self,
            _template: EmailTemplate,
            _recipient: Recipient,
            _payload: EmailPayload,
        ) -> std::result::Result<(), NotifyError> {
            Ok(())
        }
    }

    async fn service_with_product(
        available: u32,
    ) -> (FulfillmentService<InMemoryEventStore>, InMemoryCatalog, ProductId, FarmerId) {
        let catalog = InMemoryCatalog::new();
        let product_id = ProductId::new();
        let farmer_id = FarmerId::new();
        catalog
            .upsert_product(ProductSnapshot {
                product_id,
                name: "Honey".to_string(),
                price: Money::from_minor(250),
                available,
                farmer_id,
            })
            .await;

        let service = FulfillmentService::new(
            InMemoryEventStore::new(),
            Collaborators {
                catalog: Arc::new(catalog.clone()),
                carts: Arc::new(InMemoryCartStore::new()),
                notifier: Arc::new(Silent),
            },
        );
        (service, catalog, product_id, farmer_id)
    }

    #[tokio::test]
    async fn checkout_snapshots_price_and_clears_cart() {
        let (service, catalog, product_id, farmer_id) = service_with_product(5).await;
        let buyer = BuyerId::new();
        service.add_to_cart(buyer, product_id, 2).await.unwrap();

        let order = service.place_order(buyer, "  1 Bee Lane ").await.unwrap();

        assert_eq!(order.total_price().minor(), 500);
        assert_eq!(order.delivery_address(), "1 Bee Lane");
        assert_eq!(order.items()[0].farmer_id, farmer_id);
        assert_eq!(catalog.available(product_id).await, Some(3));
        assert!(service.cart(buyer).await.unwrap().is_empty());
    }

    /// Adds another line right after the cart has been read for checkout.
    struct AddsDuringCheckout {
        inner: InMemoryCartStore,
        late: ProductId,
    }

    #[async_trait]
    impl CartStore for AddsDuringCheckout {
        async fn get_cart(
            &self,
            buyer_id: BuyerId,
        ) -> std::result::Result<Vec<CartLine>, CartError> {
            let snapshot = self.inner.get_cart(buyer_id).await?;
            self.inner.add_item(buyer_id, self.late, 1).await?;
            Ok(snapshot)
        }

        async fn add_item(
            &self,
            buyer_id: BuyerId,
            product_id: ProductId,
            quantity: u32,
        ) -> std::result::Result<Vec<CartLine>, CartError> {
            self.inner.add_item(buyer_id, product_id, quantity).await
        }

        async fn set_quantity(
            &self,
            buyer_id: BuyerId,
            product_id: ProductId,
            quantity: u32,
        ) -> std::result::Result<Vec<CartLine>, CartError> {
            self.inner.set_quantity(buyer_id, product_id, quantity).await
        }

        async fn remove_item(
            &self,
            buyer_id: BuyerId,
            product_id: ProductId,
        ) -> std::result::Result<Vec<CartLine>, CartError> {
            self.inner.remove_item(buyer_id, product_id).await
        }

        async fn remove_ordered(
            &self,
            buyer_id: BuyerId,
            ordered: &[CartLine],
        ) -> std::result::Result<Vec<CartLine>, CartError> {
            self.inner.remove_ordered(buyer_id, ordered).await
        }

        async fn clear_cart(&self, buyer_id: BuyerId) -> std::result::Result<(), CartError> {
            self.inner.clear_cart(buyer_id).await
        }
    }

    #[tokio::test]
    async fn lines_added_during_checkout_stay_in_the_cart() {
        let (_, catalog, product_id, _) = service_with_product(5).await;
        let late = ProductId::new();
        let inner = InMemoryCartStore::new();
        let buyer = BuyerId::new();
        inner.add_item(buyer, product_id, 2).await.unwrap();

        let service = FulfillmentService::new(
            InMemoryEventStore::new(),
            Collaborators {
                catalog: Arc::new(catalog.clone()),
                carts: Arc::new(AddsDuringCheckout {
                    inner: inner.clone(),
                    late,
                }),
                notifier: Arc::new(Silent),
            },
        );

        let order = service.place_order(buyer, "1 Bee Lane").await.unwrap();
        assert_eq!(order.item_count(), 1);
        assert_eq!(
            inner.get_cart(buyer).await.unwrap(),
            vec![CartLine {
                product_id: late,
                quantity: 1
            }]
        );
    }

    #[tokio::test]
    async fn farmer_delivers_a_shipped_item() {
        let (service, _, product_id, farmer_id) = service_with_product(5).await;
        let buyer = BuyerId::new();
        service.add_to_cart(buyer, product_id, 1).await.unwrap();
        let order = service.place_order(buyer, "1 Bee Lane").await.unwrap();
        let order_id = order.id().unwrap();
        let item_id = order.items()[0].item_id;
        let farmer = Actor::Farmer(farmer_id);

        for status in ["accepted", "shipped"] {
            service
                .update_item_status(order_id, item_id, status, farmer)
                .await
                .unwrap();
        }
        assert!(matches!(
            service.cancel_item(order_id, item_id, Actor::Buyer(buyer)).await,
            Err(FulfillmentError::InvalidTransition { .. })
        ));

        let delivered = service
            .update_item_status(order_id, item_id, "delivered", farmer)
            .await
            .unwrap();
        assert_eq!(delivered.items()[0].status, ItemStatus::Delivered);
        assert_eq!(delivered.status(), OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn blank_address_is_validation() {
        let (service, _, product_id, _) = service_with_product(5).await;
        let buyer = BuyerId::new();
        service.add_to_cart(buyer, product_id, 1).await.unwrap();

        assert!(matches!(
            service.place_order(buyer, "   ").await,
            Err(FulfillmentError::Validation(_))
        ));
        assert_eq!(service.cart(buyer).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn adding_unknown_product_is_not_found() {
        let (service, _, _, _) = service_with_product(5).await;
        assert!(matches!(
            service.add_to_cart(BuyerId::new(), ProductId::new(), 1).await,
            Err(FulfillmentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_status_string_is_validation() {
        let (service, _, product_id, farmer_id) = service_with_product(5).await;
        let buyer = BuyerId::new();
        service.add_to_cart(buyer, product_id, 1).await.unwrap();
        let order = service.place_order(buyer, "1 Bee Lane").await.unwrap();
        let order_id = order.id().unwrap();

        let item_id = order.items()[0].item_id;
        let farmer = Actor::Farmer(farmer_id);

        let result = service
            .update_item_status(order_id, item_id, "Teleported", farmer)
            .await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));

        let accepted = service
            .update_item_status(order_id, item_id, "accepted", farmer)
            .await
            .unwrap();
        assert_eq!(accepted.status(), OrderStatus::Accepted);
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let (service, _, _, _) = service_with_product(5).await;
        assert!(matches!(
            service.get_order(AggregateId::new()).await,
            Err(FulfillmentError::NotFound(_))
        ));
        assert!(matches!(
            service
                .cancel_item(AggregateId::new(), ItemId::new(), Actor::Buyer(BuyerId::new()))
                .await,
            Err(FulfillmentError::NotFound(_))
        ));
    }
}
