//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod status;
mod value_objects;

pub use aggregate::Order;
pub use commands::*;
pub use events::{ItemAdvancedData, ItemCancelledData, OrderEvent, OrderPlacedData};
pub use service::{DEFAULT_MAX_WRITE_RETRIES, OrderService};
pub use status::{ItemStatus, OrderStatus};
pub use value_objects::{Actor, LineItem, Money, NewLineItem, PaymentMethod};

use common::{ItemId, ProductId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order already placed")]
    AlreadyPlaced,

    #[error("Order has not been placed")]
    NotPlaced,

    #[error("Order has no items")]
    NoItems,

    #[error("Invalid quantity {quantity} for product {product_id} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    #[error("Invalid price {price} for product {product_id} (must not be negative)")]
    InvalidPrice { product_id: ProductId, price: i64 },

    #[error("Delivery address is required")]
    MissingAddress,

    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// The actor does not own the addressed item or order.
    #[error("{actor} may not change item {item_id}")]
    Unauthorized { actor: Actor, item_id: ItemId },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },

    #[error("Unknown status: {0:?}")]
    UnknownStatus(String),
}
