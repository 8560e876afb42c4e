//! Command handling infrastructure.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    pub new_version: Version,
}

/// A request to change one aggregate.
pub trait Command: Send + Sync {
    type Aggregate: Aggregate;

    fn aggregate_id(&self) -> AggregateId;
}

/// Runs commands as load, decide, append.
///
/// Every append carries the version the aggregate was loaded at, so a
/// concurrent writer makes the append fail with a conflict instead of being
/// overwritten.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replays an aggregate's events. Unknown ids yield a default aggregate.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        let envelopes = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in envelopes {
            let event: A::Event = envelope.decode()?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        Ok(aggregate.id().is_some().then_some(aggregate))
    }

    /// Executes a command once and persists the resulting events.
    ///
    /// The command function receives the current aggregate state and returns
    /// either the events to append or an error.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        let envelopes = Self::build_envelopes(aggregate_id, current_version, &events)?;
        let new_version = self
            .store
            .append(envelopes, AppendOptions::expect_version(current_version))
            .await?;

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Executes a command, reloading and re-deciding on version conflicts.
    ///
    /// Each retry sees the events that won the race, so the command is judged
    /// against current state. After `max_attempts` conflicting attempts the
    /// last conflict is returned.
    pub async fn execute_with_retry<F>(
        &self,
        aggregate_id: AggregateId,
        max_attempts: u32,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: Fn(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.execute(aggregate_id, &command_fn).await {
                Err(err) if err.is_conflict() && attempt < max_attempts => {
                    metrics::counter!("order_write_conflicts_total").increment(1);
                    tracing::debug!(%aggregate_id, attempt, "version conflict, retrying");
                    attempt += 1;
                }
                Err(err) if err.is_conflict() => {
                    metrics::counter!("order_write_conflicts_total").increment(1);
                    tracing::warn!(
                        %aggregate_id,
                        attempt,
                        "giving up after repeated version conflicts"
                    );
                    return Err(err);
                }
                other => return other,
            }
        }
    }

    fn build_envelopes(
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            envelopes.push(EventEnvelope::record(
                aggregate_id,
                A::aggregate_type(),
                event.event_type(),
                version,
                event,
            )?);
        }

        Ok(envelopes)
    }
}
