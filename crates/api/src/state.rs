//! Shared state handed to every handler.

use std::sync::Arc;

use event_store::EventStore;
use fulfillment::{
    CartStore, Catalog, Collaborators, ContactDirectory, FulfillmentService, HubNotifier, Mailer,
    SessionHub,
};

/// Which collaborator implementations the server runs with.
#[derive(Clone)]
pub struct Backends {
    pub catalog: Arc<dyn Catalog>,
    pub carts: Arc<dyn CartStore>,
    pub contacts: Arc<dyn ContactDirectory>,
    pub mailer: Arc<dyn Mailer>,
}

pub struct AppState<S: EventStore + Clone> {
    pub service: FulfillmentService<S>,
    pub sessions: SessionHub,
    /// `"memory"` or `"postgres"`, reported by `/health`.
    pub store_kind: &'static str,
}

impl<S: EventStore + Clone> AppState<S> {
    pub fn new(
        store: S,
        store_kind: &'static str,
        backends: Backends,
        max_write_retries: u32,
    ) -> Self {
        let sessions = SessionHub::default();
        let notifier = HubNotifier::new(sessions.clone(), backends.contacts, backends.mailer);

        let service = FulfillmentService::with_max_write_retries(
            store,
            Collaborators {
                catalog: backends.catalog,
                carts: backends.carts,
                notifier: Arc::new(notifier),
            },
            max_write_retries,
        );

        Self {
            service,
            sessions,
            store_kind,
        }
    }
}
