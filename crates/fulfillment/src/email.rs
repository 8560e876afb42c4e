//! Email templates for order notifications.

use common::{AggregateId, BuyerId};
use domain::{Aggregate, LineItem, Money, Order, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::services::Contact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailTemplate {
    /// To the buyer after checkout.
    OrderConfirmation,
    /// To each farmer with items in a new order.
    FarmerNewOrder,
    /// To the buyer when a farmer changes one of their items.
    OrderStatusUpdate,
    /// To the farmer when the buyer cancels one of their items.
    ItemCancelled,
}

/// Order facts a template is rendered from.
///
/// `items` holds only the lines relevant to the recipient: the whole order
/// for a confirmation, a farmer's own lines for a new-order notice, the
/// changed line for status updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPayload {
    pub order_id: AggregateId,
    pub buyer_id: BuyerId,
    pub order_status: OrderStatus,
    pub total_price: Money,
    pub delivery_address: String,
    pub items: Vec<LineItem>,
}

impl EmailPayload {
    /// Payload with every line of the order. Returns None for an unplaced order.
    pub fn for_order(order: &Order) -> Option<Self> {
        let (Some(order_id), Some(buyer_id)) = (order.id(), order.buyer_id()) else {
            return None;
        };
        Some(Self {
            order_id,
            buyer_id,
            order_status: order.status(),
            total_price: order.total_price(),
            delivery_address: order.delivery_address().to_string(),
            items: order.items().to_vec(),
        })
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = LineItem>) -> Self {
        self.items = items.into_iter().collect();
        self
    }

    pub fn short_ref(&self) -> String {
        self.order_id.short_ref()
    }
}

/// Subject and plain-text body ready for a mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

impl EmailTemplate {
    pub fn subject(&self, payload: &EmailPayload) -> String {
        let reference = payload.short_ref();
        match self {
            EmailTemplate::OrderConfirmation => format!("✅ Order #{reference} is confirmed"),
            EmailTemplate::FarmerNewOrder => format!("📦 New Order Received - #{reference}"),
            EmailTemplate::OrderStatusUpdate => {
                let status = payload
                    .items
                    .first()
                    .map(|item| item.status.as_str())
                    .unwrap_or(payload.order_status.as_str());
                format!("📦 Order #{reference} - {status}")
            }
            EmailTemplate::ItemCancelled => format!("❌ Order #{reference} - item cancelled"),
        }
    }

    /// Renders the email for `recipient`. `buyer` is shown to farmers so
    /// they know who ordered.
    pub fn render(
        &self,
        payload: &EmailPayload,
        recipient: &Contact,
        buyer: Option<&Contact>,
    ) -> RenderedEmail {
        let reference = payload.short_ref();
        let mut body = format!("Hello {},\n\n", recipient.name);

        match self {
            EmailTemplate::OrderConfirmation => {
                body.push_str(&format!("Thank you for your order #{reference}.\n\n"));
                push_items(&mut body, &payload.items);
                body.push_str(&format!("\nTotal: {}\n", payload.total_price));
                body.push_str("Payment: cash on delivery\n");
                body.push_str(&format!("Delivering to: {}\n", payload.delivery_address));
            }
            EmailTemplate::FarmerNewOrder => {
                body.push_str(&format!("You have received a new order #{reference}.\n\n"));
                push_items(&mut body, &payload.items);
                if let Some(buyer) = buyer {
                    body.push_str(&format!("\nBuyer: {} <{}>\n", buyer.name, buyer.email));
                }
                body.push_str(&format!("Deliver to: {}\n", payload.delivery_address));
            }
            EmailTemplate::OrderStatusUpdate => {
                for item in &payload.items {
                    body.push_str(&format!(
                        "{} in order #{reference} is now {}.\n",
                        item.product_name, item.status
                    ));
                }
                body.push_str(&format!("\nOrder status: {}\n", payload.order_status));
            }
            EmailTemplate::ItemCancelled => {
                body.push_str(&format!("The buyer cancelled items in order #{reference}:\n\n"));
                push_items(&mut body, &payload.items);
            }
        }

        RenderedEmail {
            subject: self.subject(payload),
            body,
        }
    }
}

fn push_items(body: &mut String, items: &[LineItem]) {
    for item in items {
        body.push_str(&format!(
            "- {} x {} @ {} = {}\n",
            item.product_name,
            item.quantity,
            item.unit_price,
            item.line_total()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{FarmerId, ItemId, ProductId};
    use domain::{ItemStatus, NewLineItem};

    fn payload() -> EmailPayload {
        let farmer = FarmerId::new();
        let items = vec![
            LineItem::pending(
                ItemId::new(),
                NewLineItem::new(ProductId::new(), "Tomatoes", farmer, 2, Money::from_minor(4_000)),
            ),
            LineItem::pending(
                ItemId::new(),
                NewLineItem::new(ProductId::new(), "Onions", farmer, 1, Money::from_minor(2_550)),
            ),
        ];
        EmailPayload {
            order_id: AggregateId::new(),
            buyer_id: BuyerId::new(),
            order_status: OrderStatus::Pending,
            total_price: Money::from_minor(10_550),
            delivery_address: "12 Orchard Lane".to_string(),
            items,
        }
    }

    fn contact(name: &str) -> Contact {
        Contact {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    #[test]
    fn subjects_carry_the_short_reference() {
        let payload = payload();
        let reference = payload.order_id.short_ref();
        assert_eq!(reference.len(), 8);

        for template in [
            EmailTemplate::OrderConfirmation,
            EmailTemplate::FarmerNewOrder,
            EmailTemplate::OrderStatusUpdate,
            EmailTemplate::ItemCancelled,
        ] {
            assert!(template.subject(&payload).contains(&format!("#{reference}")));
        }
    }

    #[test]
    fn status_update_subject_names_the_item_status() {
        let mut payload = payload();
        payload.items.truncate(1);
        payload.items[0].status = ItemStatus::Shipped;

        let subject = EmailTemplate::OrderStatusUpdate.subject(&payload);
        assert!(subject.ends_with("- Shipped"), "{subject}");
    }

    #[test]
    fn confirmation_lists_lines_and_total() {
        let rendered = EmailTemplate::OrderConfirmation.render(&payload(), &contact("Asha"), None);

        assert!(rendered.body.starts_with("Hello Asha,"));
        assert!(rendered.body.contains("- Tomatoes x 2 @ ₹40.00 = ₹80.00"));
        assert!(rendered.body.contains("Total: ₹105.50"));
        assert!(rendered.body.contains("12 Orchard Lane"));
    }

    #[test]
    fn farmer_notice_includes_buyer_contact() {
        let rendered = EmailTemplate::FarmerNewOrder.render(
            &payload(),
            &contact("Ravi"),
            Some(&contact("Asha")),
        );

        assert!(rendered.body.contains("Buyer: Asha <asha@example.com>"));
        assert!(rendered.body.contains("Deliver to: 12 Orchard Lane"));
    }
}
