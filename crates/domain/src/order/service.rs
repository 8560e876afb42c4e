//! Order service providing a simplified API for order operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{CancelItem, Order, PlaceOrder, UpdateItemStatus};

/// Attempts per write before a version conflict is surfaced.
pub const DEFAULT_MAX_WRITE_RETRIES: u32 = 3;

/// Service for placing orders and changing their items.
///
/// Item writes retry on version conflicts, so concurrent updates to
/// different items of one order both land.
pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
    max_write_retries: u32,
}

impl<S: EventStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self::with_max_write_retries(store, DEFAULT_MAX_WRITE_RETRIES)
    }

    pub fn with_max_write_retries(store: S, max_write_retries: u32) -> Self {
        Self {
            handler: CommandHandler::new(store),
            max_write_retries,
        }
    }

    pub fn handler(&self) -> &CommandHandler<S, Order> {
        &self.handler
    }

    pub fn store(&self) -> &S {
        self.handler.store()
    }

    #[tracing::instrument(
        skip(self, cmd),
        fields(order_id = %cmd.order_id, buyer_id = %cmd.buyer_id)
    )]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<CommandResult<Order>, DomainError> {
        let PlaceOrder {
            order_id,
            buyer_id,
            lines,
            delivery_address,
        } = cmd;

        self.handler
            .execute(order_id, |order| {
                order.place(order_id, buyer_id, lines, delivery_address)
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_item_status(
        &self,
        cmd: UpdateItemStatus,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute_with_retry(cmd.order_id, self.max_write_retries, |order| {
                order.update_item_status(cmd.item_id, cmd.status, cmd.actor)
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel_item(&self, cmd: CancelItem) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute_with_retry(cmd.order_id, self.max_write_retries, |order| {
                order.cancel_item(cmd.item_id, cmd.actor)
            })
            .await
    }

    /// Loads an order by ID. Returns None if it was never placed.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.handler.load_existing(order_id).await
    }
}
