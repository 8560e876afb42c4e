//! The notification seam used by the fulfillment service.

use std::sync::Arc;

use async_trait::async_trait;
use common::BuyerId;

use super::contacts::{ContactDirectory, Recipient};
use super::mailer::{EmailMessage, Mailer, NotifyError};
use crate::email::{EmailPayload, EmailTemplate};
use crate::session::{OrderUpdate, SessionHub};

/// Push and email delivery.
///
/// Both are best effort: a push with no live session is dropped, and a
/// failed email is reported to the caller but never retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns how many live sessions received the update.
    async fn push_to_session(&self, buyer_id: BuyerId, update: OrderUpdate) -> usize;

    async fn send_email(
        &self,
        template: EmailTemplate,
        recipient: Recipient,
        payload: EmailPayload,
    ) -> Result<(), NotifyError>;
}

/// Pushes through a [`SessionHub`] and mails through a [`Mailer`].
#[derive(Clone)]
pub struct HubNotifier {
    hub: SessionHub,
    contacts: Arc<dyn ContactDirectory>,
    mailer: Arc<dyn Mailer>,
}

impl HubNotifier {
    pub fn new(
        hub: SessionHub,
        contacts: Arc<dyn ContactDirectory>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            hub,
            contacts,
            mailer,
        }
    }

    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }
}

#[async_trait]
impl Notifier for HubNotifier {
    async fn push_to_session(&self, buyer_id: BuyerId, update: OrderUpdate) -> usize {
        self.hub.publish(buyer_id, update).await
    }

    async fn send_email(
        &self,
        template: EmailTemplate,
        recipient: Recipient,
        payload: EmailPayload,
    ) -> Result<(), NotifyError> {
        let contact = self
            .contacts
            .contact(recipient)
            .await
            .ok_or(NotifyError::NoContact(recipient))?;

        let buyer = match template {
            EmailTemplate::FarmerNewOrder => {
                self.contacts
                    .contact(Recipient::Buyer(payload.buyer_id))
                    .await
            }
            _ => None,
        };

        let rendered = template.render(&payload, &contact, buyer.as_ref());
        self.mailer
            .send(EmailMessage {
                to: contact.email,
                subject: rendered.subject,
                body: rendered.body,
            })
            .await
    }
}
