//! Who hears about an order change, and how.
//!
//! Pushes go to the buyer's live sessions right away. Emails are spawned on
//! the runtime and never awaited: a slow or failing mailer cannot delay or
//! fail the operation that triggered it.

use std::sync::Arc;

use common::ItemId;
use domain::{Actor, Aggregate, ItemStatus, Order};

use crate::email::{EmailPayload, EmailTemplate};
use crate::services::{Notifier, Recipient};
use crate::session::OrderUpdate;

#[derive(Clone)]
pub struct NotificationFanout {
    notifier: Arc<dyn Notifier>,
}

impl NotificationFanout {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Checkout: push to the buyer, confirm by email, and tell each farmer
    /// about their own lines.
    pub async fn order_placed(&self, order: &Order) {
        let (Some(order_id), Some(buyer_id), Some(payload)) =
            (order.id(), order.buyer_id(), EmailPayload::for_order(order))
        else {
            return;
        };

        let sessions = self
            .notifier
            .push_to_session(buyer_id, OrderUpdate::placed(order_id, order.status()))
            .await;
        tracing::debug!(%order_id, sessions, "placement pushed");

        self.spawn_email(
            EmailTemplate::OrderConfirmation,
            Recipient::Buyer(buyer_id),
            payload.clone(),
        );

        for farmer_id in order.farmer_ids() {
            let farmer_payload = payload
                .clone()
                .with_items(order.items_for_farmer(farmer_id).cloned());
            self.spawn_email(
                EmailTemplate::FarmerNewOrder,
                Recipient::Farmer(farmer_id),
                farmer_payload,
            );
        }
    }

    /// Item change: push to the buyer, then email the other party.
    ///
    /// A buyer cancelling tells the item's farmer; any farmer change tells
    /// the buyer.
    pub async fn item_changed(&self, order: &Order, item_id: ItemId, actor: Actor) {
        let (Some(order_id), Some(buyer_id), Some(payload)) =
            (order.id(), order.buyer_id(), EmailPayload::for_order(order))
        else {
            return;
        };
        let Some(item) = order.item(item_id) else {
            return;
        };

        let update = OrderUpdate::item_changed(order_id, order.status(), item_id, item.status);
        let sessions = self.notifier.push_to_session(buyer_id, update).await;
        tracing::debug!(%order_id, %item_id, sessions, "item change pushed");

        let payload = payload.with_items([item.clone()]);
        match actor {
            Actor::Buyer(_) if item.status == ItemStatus::Cancelled => {
                self.spawn_email(
                    EmailTemplate::ItemCancelled,
                    Recipient::Farmer(item.farmer_id),
                    payload,
                );
            }
            Actor::Buyer(_) => {}
            Actor::Farmer(_) => {
                self.spawn_email(
                    EmailTemplate::OrderStatusUpdate,
                    Recipient::Buyer(buyer_id),
                    payload,
                );
            }
        }
    }

    fn spawn_email(&self, template: EmailTemplate, recipient: Recipient, payload: EmailPayload) {
        let notifier = Arc::clone(&self.notifier);
        let order_id = payload.order_id;

        tokio::spawn(async move {
            if let Err(e) = notifier.send_email(template, recipient, payload).await {
                metrics::counter!("notifications_failed_total").increment(1);
                tracing::warn!(
                    %order_id,
                    %recipient,
                    ?template,
                    error = %e,
                    "email notification failed"
                );
            }
        });
    }
}
