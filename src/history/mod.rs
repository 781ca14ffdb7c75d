use crate::models::chat::{ ConversationMessage, DisplayLogEntry, Role };
use log::debug;
use tokio::sync::Mutex;

#[derive(Default)]
struct StoreState {
    history: Vec<ConversationMessage>,
    display_log: Vec<DisplayLogEntry>,
}

/// Process-wide conversation history and display log.
///
/// Both sequences are append-only. Appends that belong together (an inbound
/// message and its log line, a delivered reply and its log line) happen under
/// a single lock acquisition so concurrent webhook deliveries never interleave
/// them.
#[derive(Default)]
pub struct ConversationStore {
    state: Mutex<StoreState>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the inbound message and returns the history as it stands right
    /// after it, so the message is always the latest User turn of the snapshot.
    pub async fn record_inbound(&self, from: &str, content: &str) -> Vec<ConversationMessage> {
        let mut state = self.state.lock().await;
        state.display_log.push(DisplayLogEntry::new(format!("Customer({}): \"{}\"", from, content)));
        state.history.push(ConversationMessage::user(content));
        debug!("History length after inbound message: {}", state.history.len());
        state.history.clone()
    }

    pub async fn record_reply(&self, content: &str) {
        let mut state = self.state.lock().await;
        state.history.push(ConversationMessage::assistant(content));
        state.display_log.push(DisplayLogEntry::new(format!("Assistant: {}", content)));
    }

    pub async fn log(&self, text: impl Into<String>) {
        self.state.lock().await.display_log.push(DisplayLogEntry::new(text));
    }

    pub async fn history(&self) -> Vec<ConversationMessage> {
        self.state.lock().await.history.clone()
    }

    pub async fn display_log(&self) -> Vec<DisplayLogEntry> {
        self.state.lock().await.display_log.clone()
    }

    pub async fn history_len(&self) -> usize {
        self.state.lock().await.history.len()
    }
}

/// Returns the most recent message sent by the customer, if any.
pub fn last_user_message(history: &[ConversationMessage]) -> Option<&ConversationMessage> {
    history.iter().rev().find(|m| m.role == Role::User)
}

/// The trailing `limit` entries of `history`, oldest first.
pub fn recent_window(history: &[ConversationMessage], limit: usize) -> &[ConversationMessage] {
    let start = history.len().saturating_sub(limit);
    &history[start..]
}
