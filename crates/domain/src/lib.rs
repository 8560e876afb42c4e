//! Order fulfillment domain.
//!
//! - [`Aggregate`] / [`DomainEvent`] for event-sourced entities
//! - [`CommandHandler`] with optimistic-concurrency retry
//! - the multi-vendor [`Order`] with its per-item state machine and
//!   derived order status

pub mod aggregate;
pub mod command;
pub mod error;
pub mod order;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use order::{
    Actor, CancelItem, DEFAULT_MAX_WRITE_RETRIES, ItemAdvancedData, ItemCancelledData, ItemStatus,
    LineItem, Money, NewLineItem, Order, OrderError, OrderEvent, OrderPlacedData, OrderService,
    OrderStatus, PaymentMethod, PlaceOrder, UpdateItemStatus,
};
