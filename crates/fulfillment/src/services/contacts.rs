//! Names and email addresses of buyers and farmers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BuyerId, FarmerId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "lowercase")]
pub enum Recipient {
    Buyer(BuyerId),
    Farmer(FarmerId),
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Buyer(id) => write!(f, "buyer:{id}"),
            Recipient::Farmer(id) => write!(f, "farmer:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn contact(&self, recipient: Recipient) -> Option<Contact>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryContactDirectory {
    contacts: Arc<RwLock<HashMap<Recipient, Contact>>>,
}

impl InMemoryContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, recipient: Recipient, contact: Contact) {
        self.contacts.write().await.insert(recipient, contact);
    }
}

#[async_trait]
impl ContactDirectory for InMemoryContactDirectory {
    async fn contact(&self, recipient: Recipient) -> Option<Contact> {
        self.contacts.read().await.get(&recipient).cloned()
    }
}
