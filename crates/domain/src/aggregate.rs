//! Event-sourced aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded against an aggregate, named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Name stored as the envelope's `event_type`.
    fn event_type(&self) -> &'static str;
}

/// An aggregate rebuilt by replaying its events.
///
/// Command methods inspect the current state and return new events (or an
/// error); [`Aggregate::apply`] folds a single event into the state. `apply`
/// must be deterministic and infallible, since the events already happened.
pub trait Aggregate: Default + Send + Sync + Sized {
    type Event: DomainEvent;

    type Error: std::error::Error + Send + Sync;

    /// Stream name, also stored on every envelope.
    fn aggregate_type() -> &'static str;

    /// `None` until the creation event has been applied.
    fn id(&self) -> Option<AggregateId>;

    /// Version of the last applied event, `0` for an empty stream.
    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);

    fn apply(&mut self, event: Self::Event);

    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Rebuilds an aggregate from scratch.
    fn from_events(events: impl IntoIterator<Item = Self::Event>) -> Self {
        let mut aggregate = Self::default();
        aggregate.apply_events(events);
        aggregate
    }
}
