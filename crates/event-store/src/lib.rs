//! Append-only event persistence for order aggregates.
//!
//! Every write names the version it expects the stream to be at; a mismatch
//! is reported as [`EventStoreError::ConcurrencyConflict`] so callers can
//! reload and retry instead of silently overwriting a concurrent change.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
