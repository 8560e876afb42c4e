//! Order directory: which orders belong to a buyer, and which ones a farmer has items in.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{AggregateId, BuyerId, FarmerId};
use domain::{Aggregate, Order, OrderEvent};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

#[derive(Default)]
struct DirectoryState {
    /// Order ids per buyer, in placement order.
    by_buyer: HashMap<BuyerId, Vec<AggregateId>>,
    /// Order ids per farmer, in placement order.
    by_farmer: HashMap<FarmerId, Vec<AggregateId>>,
    known: HashSet<AggregateId>,
    position: ProjectionPosition,
}

/// Indexes placed orders by buyer and by farmer.
///
/// Only `OrderPlaced` matters here: item membership never changes after
/// checkout, so the farmer set of an order is fixed at that point. Queries
/// return the newest order first.
#[derive(Clone, Default)]
pub struct OrderDirectoryView {
    state: Arc<RwLock<DirectoryState>>,
}

impl OrderDirectoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn orders_for_buyer(&self, buyer_id: BuyerId) -> Vec<AggregateId> {
        let state = self.state.read().await;
        newest_first(state.by_buyer.get(&buyer_id))
    }

    pub async fn orders_for_farmer(&self, farmer_id: FarmerId) -> Vec<AggregateId> {
        let state = self.state.read().await;
        newest_first(state.by_farmer.get(&farmer_id))
    }

    pub async fn contains(&self, order_id: AggregateId) -> bool {
        self.state.read().await.known.contains(&order_id)
    }
}

fn newest_first(ids: Option<&Vec<AggregateId>>) -> Vec<AggregateId> {
    ids.map(|ids| ids.iter().rev().copied().collect())
        .unwrap_or_default()
}

#[async_trait]
impl Projection for OrderDirectoryView {
    fn name(&self) -> &'static str {
        "OrderDirectoryView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let mut state = self.state.write().await;
        state.position = state.position.advance();

        if event.aggregate_type != Order::aggregate_type() || event.event_type != "OrderPlaced" {
            return Ok(());
        }

        let OrderEvent::OrderPlaced(data) = event.decode::<OrderEvent>()? else {
            return Ok(());
        };

        if !state.known.insert(data.order_id) {
            return Ok(());
        }

        state
            .by_buyer
            .entry(data.buyer_id)
            .or_default()
            .push(data.order_id);

        let mut farmers: Vec<FarmerId> = data.items.iter().map(|item| item.farmer_id).collect();
        farmers.sort();
        farmers.dedup();
        for farmer_id in farmers {
            state
                .by_farmer
                .entry(farmer_id)
                .or_default()
                .push(data.order_id);
        }

        tracing::trace!(order_id = %data.order_id, buyer_id = %data.buyer_id, "order indexed");
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = DirectoryState::default();
        Ok(())
    }
}

impl ReadModel for OrderDirectoryView {
    fn name(&self) -> &'static str {
        "OrderDirectoryView"
    }

    fn count(&self) -> usize {
        // Non-blocking; reports 0 while a writer holds the lock.
        self.state.try_read().map(|s| s.known.len()).unwrap_or(0)
    }
}
