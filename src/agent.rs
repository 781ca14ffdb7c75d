use crate::cli::Args;
use crate::config::prompt;
use crate::generator::ResponseGenerator;
use crate::history::ConversationStore;
use crate::llm::LlmConfig;
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::messaging::{ MessageSender, ReplyDispatcher };
use crate::messaging::acs::{ AcsConnection, AcsNotificationClient };
use crate::rag::rag::{ KnowledgeRetriever, RetrieverConfig };
use crate::rag::search::{ AzureSearchClient, KnowledgeIndex };

use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Runs the retrieve → generate → deliver pipeline for inbound customer messages.
#[derive(Clone)]
pub struct ConciergeAgent {
    store: Arc<ConversationStore>,
    retriever: KnowledgeRetriever,
    generator: ResponseGenerator,
    dispatcher: ReplyDispatcher,
}

impl ConciergeAgent {
    pub fn from_parts(
        store: Arc<ConversationStore>,
        retriever: KnowledgeRetriever,
        generator: ResponseGenerator,
        dispatcher: ReplyDispatcher
    ) -> Self {
        Self { store, retriever, generator, dispatcher }
    }

    fn initialize_chat_client(
        args: &Args,
        timeout: Duration
    ) -> Result<Arc<dyn ChatClient>, Box<dyn Error + Send + Sync>> {
        let chat_api_key = if !args.chat_api_key.is_empty() {
            Some(args.chat_api_key.clone())
        } else {
            None
        };
        let chat_config = LlmConfig {
            llm_type: args.chat_llm_type
                .parse()
                .map_err(|e| format!("Invalid chat LLM type: {}", e))?,
            base_url: args.chat_base_url.clone(),
            api_key: chat_api_key,
            completion_model: args.chat_model.clone(),
            api_version: Some(args.chat_api_version.clone()),
            timeout,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={:?}, BaseURL={:?}",
            args.chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );
        Ok(chat_client)
    }

    fn initialize_knowledge_index(
        args: &Args,
        timeout: Duration
    ) -> Result<Arc<dyn KnowledgeIndex>, Box<dyn Error + Send + Sync>> {
        info!("Connecting to search index '{}' at: {}", args.search_index, args.search_endpoint);
        let client = AzureSearchClient::new(
            &args.search_endpoint,
            &args.search_index,
            &args.search_api_key,
            &args.search_api_version,
            timeout
        )?;
        Ok(Arc::new(client))
    }

    fn initialize_sender(
        args: &Args,
        timeout: Duration
    ) -> Result<(Arc<dyn MessageSender>, Uuid), Box<dyn Error + Send + Sync>> {
        let connection: AcsConnection = args.acs_connection_string
            .parse()
            .map_err(|e| format!("Invalid ACS connection string: {}", e))?;
        let channel_registration_id = Uuid::parse_str(args.channel_registration_id.trim()).map_err(|e|
            format!("Invalid channel registration id '{}': {}", args.channel_registration_id, e)
        )?;
        info!("Messaging endpoint: {}", connection.endpoint);
        let client = AcsNotificationClient::new(connection, &args.acs_api_version, timeout)?;
        Ok((Arc::new(client), channel_registration_id))
    }

    pub async fn new(
        args: Args,
        store: Arc<ConversationStore>
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let timeout = Duration::from_secs(args.request_timeout_secs);
        let chat_client = Self::initialize_chat_client(&args, timeout)?;
        let index = Self::initialize_knowledge_index(&args, timeout)?;
        let (sender, channel_registration_id) = Self::initialize_sender(&args, timeout)?;
        let prompt_config = prompt::load_or_default(args.prompts_path.as_deref())?;

        let retriever = KnowledgeRetriever::new(index, RetrieverConfig {
            top: args.rag_default_limit,
            semantic_configuration: args.search_semantic_config.clone(),
            vectorizer: args.search_vectorizer.clone(),
            vector_field: args.search_vector_field.clone(),
        });
        let generator = ResponseGenerator::new(chat_client, prompt_config, args.history_window);
        let dispatcher = ReplyDispatcher::new(sender, channel_registration_id, Arc::clone(&store));

        Ok(Self::from_parts(store, retriever, generator, dispatcher))
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub async fn handle_inbound(&self, from: &str, content: &str) {
        info!("Inbound message from {}", from);
        let history = self.store.record_inbound(from, content).await;

        let retrieval = self.retriever.retrieve(content).await;
        info!(
            "Retrieved context via {:?} (found: {})",
            retrieval.strategy,
            retrieval.found
        );

        let reply = self.generator.generate(content, &retrieval.context, &history).await;

        match reply.text {
            Some(text) => {
                self.dispatcher.deliver(from, &text).await;
            }
            None => {
                warn!("No response generated for {} ({:?})", from, reply.kind);
                self.store.log("Error: No response generated.").await;
            }
        }
    }
}
