//! Outgoing mail.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use super::contacts::Recipient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("No contact details for {0}")]
    NoContact(Recipient),

    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError>;
}

/// Writes each message to the log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        tracing::info!(
            from = %self.from,
            to = %message.to,
            subject = %message.subject,
            "email sent"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<EmailMessage>,
    fail: bool,
}

/// Keeps every message it is handed. Can be switched to fail all sends.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.state.read().await.sent.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        let mut state = self.state.write().await;
        if state.fail {
            return Err(NotifyError::Delivery(format!("refused mail to {}", message.to)));
        }
        state.sent.push(message);
        Ok(())
    }
}
