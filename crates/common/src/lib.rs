//! Identifiers shared by every crate of the fulfillment engine.

pub mod types;

pub use types::{AggregateId, BuyerId, FarmerId, ItemId, ProductId};
