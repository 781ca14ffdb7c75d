use serde::{ Serialize, Deserialize };
use chrono::Utc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayLogEntry {
    pub text: String,
    pub timestamp: i64,
}

impl DisplayLogEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), timestamp: Utc::now().timestamp() }
    }
}
