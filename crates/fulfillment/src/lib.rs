//! Order fulfillment for a multi-vendor marketplace.
//!
//! [`FulfillmentService`] turns a buyer's cart into an order, lets farmers
//! move their items through `Pending → Accepted → Shipped → Delivered`, lets
//! either side cancel early items, and answers "my orders" for both. Every
//! change is pushed to the buyer's live sessions and mailed to whoever needs
//! to know, without the mail path ever failing the change.

pub mod email;
pub mod error;
pub mod fanout;
pub mod service;
pub mod services;
pub mod session;
pub mod views;

pub use email::{EmailPayload, EmailTemplate, RenderedEmail};
pub use error::{FulfillmentError, Result};
pub use fanout::NotificationFanout;
pub use service::{Collaborators, FulfillmentService};
pub use services::{
    CartError, CartLine, CartStore, Catalog, CatalogError, Contact, ContactDirectory, EmailMessage,
    HubNotifier, InMemoryCartStore, InMemoryCatalog, InMemoryContactDirectory, LogMailer, Mailer,
    Notifier, NotifyError, PostgresCatalog, ProductSnapshot, Recipient, RecordingMailer, StockLine,
};
pub use session::{OrderUpdate, SessionHub, UpdateKind};
pub use views::FarmerOrderView;
