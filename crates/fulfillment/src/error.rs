//! Fulfillment error types.

use common::ProductId;
use domain::{DomainError, ItemStatus, OrderError};
use projections::ProjectionError;
use thiserror::Error;

use crate::services::{CartError, CatalogError};

/// Errors surfaced by the fulfillment service.
///
/// Every lower-level error is folded into one of these kinds; the HTTP
/// layer maps kinds to status codes.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not allowed: {0}")]
    Unauthorized(String),

    #[error(
        "Insufficient stock for product {product_id}: \
         {available} available, {requested} requested"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },

    #[error("Invalid request: {0}")]
    Validation(String),

    /// Backend failure, including version conflicts that outlived the retries.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl FulfillmentError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FulfillmentError::NotFound(_) => "not_found",
            FulfillmentError::Unauthorized(_) => "unauthorized",
            FulfillmentError::InsufficientStock { .. } => "insufficient_stock",
            FulfillmentError::InvalidTransition { .. } => "invalid_transition",
            FulfillmentError::Validation(_) => "validation",
            FulfillmentError::Storage(_) => "storage",
        }
    }
}

impl From<OrderError> for FulfillmentError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotPlaced => FulfillmentError::NotFound("order".to_string()),
            OrderError::ItemNotFound { item_id } => {
                FulfillmentError::NotFound(format!("item {item_id}"))
            }
            OrderError::Unauthorized { .. } => FulfillmentError::Unauthorized(err.to_string()),
            OrderError::InvalidTransition { from, to } => {
                FulfillmentError::InvalidTransition { from, to }
            }
            OrderError::AlreadyPlaced
            | OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. }
            | OrderError::MissingAddress
            | OrderError::UnknownStatus(_) => FulfillmentError::Validation(err.to_string()),
        }
    }
}

impl From<DomainError> for FulfillmentError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Order(e) => e.into(),
            DomainError::AggregateNotFound { aggregate_type, aggregate_id } => {
                FulfillmentError::NotFound(format!("{aggregate_type} {aggregate_id}"))
            }
            other => FulfillmentError::Storage(other.to_string()),
        }
    }
}

impl From<CatalogError> for FulfillmentError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound(id) => {
                FulfillmentError::NotFound(format!("product {id}"))
            }
            CatalogError::InsufficientStock {
                product_id,
                available,
                requested,
            } => FulfillmentError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            other => FulfillmentError::Storage(other.to_string()),
        }
    }
}

impl From<CartError> for FulfillmentError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ZeroQuantity | CartError::QuantityTooLarge { .. } => {
                FulfillmentError::Validation(err.to_string())
            }
            CartError::NotInCart(_) => FulfillmentError::NotFound(err.to_string()),
            CartError::Unavailable(_) => FulfillmentError::Storage(err.to_string()),
        }
    }
}

impl From<ProjectionError> for FulfillmentError {
    fn from(err: ProjectionError) -> Self {
        FulfillmentError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FulfillmentError>;
