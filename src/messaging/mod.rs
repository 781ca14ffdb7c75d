pub mod acs;

use crate::history::ConversationStore;

use async_trait::async_trait;
use log::{ info, error };
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("messaging service returned {status}: {message}")]
    Service {
        status: u16,
        message: String,
    },
    #[error("could not sign request: {0}")]
    Signing(String),
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(
        &self,
        channel_registration_id: &Uuid,
        to: &[String],
        content: &str
    ) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

/// Sends generated replies and records what happened in the conversation store.
#[derive(Clone)]
pub struct ReplyDispatcher {
    sender: Arc<dyn MessageSender>,
    channel_registration_id: Uuid,
    store: Arc<ConversationStore>,
}

impl ReplyDispatcher {
    pub fn new(
        sender: Arc<dyn MessageSender>,
        channel_registration_id: Uuid,
        store: Arc<ConversationStore>
    ) -> Self {
        Self { sender, channel_registration_id, store }
    }

    pub async fn deliver(&self, recipient: &str, text: &str) -> DeliveryOutcome {
        let to = vec![recipient.to_string()];
        match self.sender.send_text(&self.channel_registration_id, &to, text).await {
            Ok(()) => {
                info!("Reply delivered to {}", recipient);
                self.store.record_reply(text).await;
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                error!("Failed to deliver reply to {}: {}", recipient, e);
                let message = e.to_string();
                self.store
                    .log(format!("Error: Failed to respond to \"{}\". Exception: {}", recipient, message))
                    .await;
                DeliveryOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ConversationMessage;
    use crate::testing::RecordingSender;

    fn channel() -> Uuid {
        Uuid::parse_str("7d2b8f4e-9a57-4c3b-9a1e-2f1b0c9d8e7f").unwrap()
    }

    #[tokio::test]
    async fn success_appends_assistant_and_log() {
        let store = Arc::new(ConversationStore::new());
        let sender = Arc::new(RecordingSender::new());
        let dispatcher = ReplyDispatcher::new(sender.clone(), channel(), store.clone());

        let outcome = dispatcher.deliver("+1555", "See you there!").await;

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(store.history().await, vec![ConversationMessage::assistant("See you there!")]);
        assert_eq!(store.display_log().await[0].text, "Assistant: See you there!");

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, channel());
        assert_eq!(sent[0].1, vec!["+1555".to_string()]);
        assert_eq!(sent[0].2, "See you there!");
    }

    #[tokio::test]
    async fn failure_logs_without_touching_history() {
        let store = Arc::new(ConversationStore::new());
        store.record_inbound("+1555", "hello").await;
        let before = store.history_len().await;
        let dispatcher = ReplyDispatcher::new(
            Arc::new(RecordingSender::failing()),
            channel(),
            store.clone()
        );

        let outcome = dispatcher.deliver("+1555", "Hi!").await;

        assert!(matches!(outcome, DeliveryOutcome::Failed(_)));
        assert_eq!(store.history_len().await, before);
        let log = store.display_log().await;
        assert_eq!(log.len(), 2);
        assert!(log[1].text.starts_with("Error: Failed to respond to \"+1555\". Exception: "));
    }
}
