//! Projection processor for feeding events to projections.

use std::sync::Arc;

use event_store::EventStore;
use futures_util::StreamExt;
use tokio::sync::Mutex;

use crate::Result;
use crate::projection::Projection;

/// Delivers events from an event store to registered projections.
///
/// Projections track their position by count, so catch-up skips events each
/// one has already seen. Catch-up runs are serialized so two callers never
/// deliver the same event twice.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Arc<dyn Projection>>,
    catch_up_lock: Mutex<()>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
            catch_up_lock: Mutex::new(()),
        }
    }

    pub fn register(&mut self, projection: Arc<dyn Projection>) {
        self.projections.push(projection);
    }

    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Streams the store and hands each projection the events it has not seen yet.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        let _guard = self.catch_up_lock.lock().await;

        let mut stream = self.store.stream_all_events().await?;
        let mut event_index: u64 = 0;
        let mut delivered: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            event_index += 1;

            for projection in &self.projections {
                if projection.position().await.events_processed < event_index {
                    projection.handle(&event).await?;
                    delivered += 1;
                }
            }
        }

        if delivered > 0 {
            metrics::counter!("projections_events_processed").increment(delivered);
            tracing::debug!(events = event_index, delivered, "catch-up complete");
        }

        Ok(())
    }

    /// Resets all projections and replays every event from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        {
            let _guard = self.catch_up_lock.lock().await;
            for projection in &self.projections {
                tracing::info!(projection = projection.name(), "resetting projection");
                projection.reset().await?;
            }
        }
        self.run_catch_up().await
    }
}
