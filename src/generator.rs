use crate::config::prompt::{ self, PromptConfig };
use crate::history::{ last_user_message, recent_window };
use crate::llm::chat::{ ChatClient, ChatRequest, ChatRole, ChatTurn };
use crate::models::chat::{ ConversationMessage, Role };

use log::{ info, warn, error };
use std::sync::Arc;

pub const MAX_TOKENS: u32 = 800;
pub const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Generated,
    NoUserMessage,
    BlankMessage,
    EmptyResponse,
    ServiceFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    pub kind: ReplyKind,
    /// `None` when there is nothing worth sending.
    pub text: Option<String>,
}

impl GeneratedReply {
    fn new(kind: ReplyKind, text: &str) -> Self {
        let text = Some(text.to_string()).filter(|t| !t.trim().is_empty());
        Self { kind, text }
    }
}

#[derive(Clone)]
pub struct ResponseGenerator {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
    history_window: usize,
}

impl ResponseGenerator {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        prompt_config: Arc<PromptConfig>,
        history_window: usize
    ) -> Self {
        Self { chat_client, prompt_config, history_window }
    }

    pub fn build_request(&self, context: &str, history: &[ConversationMessage]) -> ChatRequest {
        let mut messages = vec![
            ChatTurn::new(ChatRole::System, prompt::get_system_message(&self.prompt_config, context))
        ];
        for msg in recent_window(history, self.history_window) {
            let role = match msg.role {
                Role::User => ChatRole::User,
                Role::Assistant => ChatRole::Assistant,
            };
            messages.push(ChatTurn::new(role, msg.content.clone()));
        }

        ChatRequest { messages, max_tokens: MAX_TOKENS, temperature: TEMPERATURE }
    }

    pub async fn generate(
        &self,
        query: &str,
        context: &str,
        history: &[ConversationMessage]
    ) -> GeneratedReply {
        let replies = &self.prompt_config.replies;

        let last_user = match last_user_message(history) {
            Some(m) => m,
            None => {
                warn!("Could not find the last user message in history.");
                return GeneratedReply::new(ReplyKind::NoUserMessage, &replies.no_user_message);
            }
        };
        if last_user.content.trim().is_empty() {
            warn!("Last user message content is empty.");
            return GeneratedReply::new(ReplyKind::BlankMessage, &replies.blank_message);
        }

        let request = self.build_request(context, history);
        info!(
            "Generating reply for '{}' with {} message(s) using {}",
            query,
            request.messages.len(),
            self.chat_client.get_model()
        );

        match self.chat_client.complete_chat(&request).await {
            Ok(resp) =>
                match resp.response {
                    Some(text) if !text.trim().is_empty() => GeneratedReply {
                        kind: ReplyKind::Generated,
                        text: Some(text),
                    },
                    _ => {
                        warn!("Chat service returned an empty response.");
                        GeneratedReply::new(ReplyKind::EmptyResponse, &replies.empty_response)
                    }
                }
            Err(e) => {
                error!("Error generating AI response: {}", e);
                GeneratedReply::new(ReplyKind::ServiceFailed, &replies.generation_failed)
            }
        }
    }
}
