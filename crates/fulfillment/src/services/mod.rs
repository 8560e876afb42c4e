//! Collaborators the fulfillment service depends on.

pub mod cart;
pub mod catalog;
pub mod contacts;
pub mod mailer;
pub mod notifier;
pub mod pg_catalog;

pub use cart::{CartError, CartLine, CartStore, InMemoryCartStore};
pub use catalog::{Catalog, CatalogError, InMemoryCatalog, ProductSnapshot, StockLine};
pub use contacts::{Contact, ContactDirectory, InMemoryContactDirectory, Recipient};
pub use mailer::{EmailMessage, LogMailer, Mailer, NotifyError, RecordingMailer};
pub use notifier::{HubNotifier, Notifier};
pub use pg_catalog::PostgresCatalog;
