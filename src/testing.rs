//! In-process stand-ins for the external services, shared by unit tests.

use crate::agent::ConciergeAgent;
use crate::config::prompt::PromptConfig;
use crate::generator::ResponseGenerator;
use crate::history::ConversationStore;
use crate::llm::chat::{ ChatClient, ChatRequest, CompletionResponse };
use crate::messaging::{ DeliveryError, MessageSender, ReplyDispatcher };
use crate::rag::rag::{ KnowledgeRetriever, RetrieverConfig };
use crate::rag::search::{ KnowledgeIndex, SearchDocument, SearchError, SearchRequest };

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::error::Error as StdError;
use std::sync::{ Arc, Mutex };
use uuid::Uuid;

pub fn doc(title: Option<&str>, chunk: Option<&str>) -> SearchDocument {
    let mut map = SearchDocument::new();
    if let Some(t) = title {
        map.insert("title".into(), Value::String(t.into()));
    }
    if let Some(c) = chunk {
        map.insert("chunk".into(), Value::String(c.into()));
    }
    map
}

/// Answers each search with the next scripted result, then with no documents.
pub struct ScriptedIndex {
    script: Mutex<VecDeque<Result<Vec<SearchDocument>, SearchError>>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl ScriptedIndex {
    pub fn new(script: Vec<Result<Vec<SearchDocument>, SearchError>>) -> Self {
        Self { script: Mutex::new(script.into()), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeIndex for ScriptedIndex {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchDocument>, SearchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

enum ChatBehavior {
    Reply(String),
    Empty,
    Fail(String),
}

pub struct ScriptedChat {
    behavior: ChatBehavior,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    fn with(behavior: ChatBehavior) -> Self {
        Self { behavior, requests: Mutex::new(Vec::new()) }
    }

    pub fn replying(text: &str) -> Self {
        Self::with(ChatBehavior::Reply(text.into()))
    }

    pub fn empty() -> Self {
        Self::with(ChatBehavior::Empty)
    }

    pub fn failing(message: &str) -> Self {
        Self::with(ChatBehavior::Fail(message.into()))
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn complete_chat(
        &self,
        request: &ChatRequest
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.behavior {
            ChatBehavior::Reply(text) => Ok(CompletionResponse { response: Some(text.clone()) }),
            ChatBehavior::Empty => Ok(CompletionResponse { response: None }),
            ChatBehavior::Fail(message) => Err(message.clone().into()),
        }
    }

    fn get_model(&self) -> String {
        "scripted".into()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

pub struct RecordingSender {
    fail: bool,
    sent: Mutex<Vec<(Uuid, Vec<String>, String)>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self { fail: false, sent: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { fail: true, sent: Mutex::new(Vec::new()) }
    }

    pub fn sent(&self) -> Vec<(Uuid, Vec<String>, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(
        &self,
        channel_registration_id: &Uuid,
        to: &[String],
        content: &str
    ) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Service {
                status: 401,
                message: "Denied by the resource provider.".into(),
            });
        }
        self.sent.lock().unwrap().push((*channel_registration_id, to.to_vec(), content.to_string()));
        Ok(())
    }
}

pub fn empty_reply_prompts() -> PromptConfig {
    let mut config = PromptConfig::default();
    config.replies.empty_response = String::new();
    config
}

pub fn build_agent(
    index: Arc<dyn KnowledgeIndex>,
    chat: Arc<ScriptedChat>,
    sender: Arc<RecordingSender>,
    prompts: Option<PromptConfig>
) -> ConciergeAgent {
    let store = Arc::new(ConversationStore::new());
    let retriever = KnowledgeRetriever::new(index, RetrieverConfig {
        top: 3,
        semantic_configuration: "sem-config".into(),
        vectorizer: "text-vectorizer".into(),
        vector_field: "text_vector".into(),
    });
    let generator = ResponseGenerator::new(chat, Arc::new(prompts.unwrap_or_default()), 10);
    let dispatcher = ReplyDispatcher::new(sender, Uuid::nil(), Arc::clone(&store));
    ConciergeAgent::from_parts(store, retriever, generator, dispatcher)
}
