pub mod agent;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;
pub mod rag;
pub mod generator;
pub mod messaging;
pub mod webhook;

#[cfg(test)]
mod testing;

use agent::ConciergeAgent;
use cli::Args;
use history::ConversationStore;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model/Deployment: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Search Endpoint: {}", args.search_endpoint);
    info!("Search Index: {}", args.search_index);
    info!("Semantic Configuration: {}", args.search_semantic_config);
    info!("Vectorizer: {}", args.search_vectorizer);
    info!("Retrieval Limit: {}", args.rag_default_limit);
    info!("History Window: {}", args.history_window);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("Request Timeout (s): {}", args.request_timeout_secs);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let store = Arc::new(ConversationStore::new());
    let agent = Arc::new(ConciergeAgent::new(args.clone(), store).await?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
