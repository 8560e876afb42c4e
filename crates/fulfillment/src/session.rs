//! Live buyer sessions.
//!
//! Each buyer has a broadcast topic. Connected clients subscribe to it and
//! receive an [`OrderUpdate`] whenever one of the buyer's orders changes.
//! Publishing to a buyer with no open session drops the update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{AggregateId, BuyerId, ItemId};
use domain::{ItemStatus, OrderStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

/// Buffered updates per session before a slow reader starts lagging.
pub const DEFAULT_SESSION_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Placed,
    ItemUpdated,
    ItemCancelled,
}

/// What a buyer's live session is told about one of their orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub kind: UpdateKind,
    pub order_id: AggregateId,
    pub order_status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_status: Option<ItemStatus>,
    pub at: DateTime<Utc>,
}

impl OrderUpdate {
    pub fn placed(order_id: AggregateId, order_status: OrderStatus) -> Self {
        Self {
            kind: UpdateKind::Placed,
            order_id,
            order_status,
            item_id: None,
            item_status: None,
            at: Utc::now(),
        }
    }

    pub fn item_changed(
        order_id: AggregateId,
        order_status: OrderStatus,
        item_id: ItemId,
        item_status: ItemStatus,
    ) -> Self {
        let kind = if item_status == ItemStatus::Cancelled {
            UpdateKind::ItemCancelled
        } else {
            UpdateKind::ItemUpdated
        };
        Self {
            kind,
            order_id,
            order_status,
            item_id: Some(item_id),
            item_status: Some(item_status),
            at: Utc::now(),
        }
    }
}

/// Per-buyer broadcast topics.
#[derive(Debug, Clone)]
pub struct SessionHub {
    topics: Arc<RwLock<HashMap<BuyerId, broadcast::Sender<OrderUpdate>>>>,
    capacity: usize,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY)
    }
}

impl SessionHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Opens a session for a buyer.
    pub async fn subscribe(&self, buyer_id: BuyerId) -> broadcast::Receiver<OrderUpdate> {
        let mut topics = self.topics.write().await;
        topics
            .entry(buyer_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Sends an update to every open session of the buyer.
    ///
    /// Returns the number of sessions that received it; zero means the
    /// update was dropped.
    pub async fn publish(&self, buyer_id: BuyerId, update: OrderUpdate) -> usize {
        let delivered = {
            let topics = self.topics.read().await;
            topics
                .get(&buyer_id)
                .and_then(|tx| tx.send(update).ok())
        };

        match delivered {
            Some(count) => count,
            None => {
                metrics::counter!("notifications_dropped_total").increment(1);
                tracing::debug!(%buyer_id, "no live session, update dropped");
                self.prune(buyer_id).await;
                0
            }
        }
    }

    pub async fn session_count(&self, buyer_id: BuyerId) -> usize {
        self.topics
            .read()
            .await
            .get(&buyer_id)
            .map_or(0, |tx| tx.receiver_count())
    }

    async fn prune(&self, buyer_id: BuyerId) {
        let mut topics = self.topics.write().await;
        if topics.get(&buyer_id).is_some_and(|tx| tx.receiver_count() == 0) {
            topics.remove(&buyer_id);
        }
    }

    #[cfg(test)]
    async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }
}
