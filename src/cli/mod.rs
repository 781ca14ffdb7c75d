use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Messaging Channel Args ---
    /// Connection string for the Azure Communication Services resource
    /// (endpoint=https://...;accesskey=...)
    #[arg(long, env = "ACS_CONNECTION_STRING")]
    pub acs_connection_string: String,

    /// Channel registration id (GUID) of the WhatsApp channel used for replies.
    #[arg(long, env = "ACS_CHANNEL_REGISTRATION_ID")]
    pub channel_registration_id: String,

    /// API version for the advanced messaging endpoint.
    #[arg(long, env = "ACS_API_VERSION", default_value = "2024-02-01")]
    pub acs_api_version: String,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (azure, openai)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "azure")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider (the Azure OpenAI resource endpoint for azure)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion. For azure this is the deployment name.
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// API version query parameter sent to Azure OpenAI deployments.
    #[arg(long, env = "CHAT_API_VERSION", default_value = "2024-06-01")]
    pub chat_api_version: String,

    // --- Knowledge Index Args ---
    /// Azure AI Search service endpoint (e.g., https://my-search.search.windows.net)
    #[arg(long, env = "SEARCH_ENDPOINT")]
    pub search_endpoint: String,

    /// Query or admin key for the search service.
    #[arg(long, env = "SEARCH_API_KEY")]
    pub search_api_key: String,

    /// Index holding the knowledge base chunks.
    #[arg(long, env = "SEARCH_INDEX_NAME")]
    pub search_index: String,

    #[arg(long, env = "SEARCH_API_VERSION", default_value = "2024-07-01")]
    pub search_api_version: String,

    /// Semantic configuration used by the semantic + vector tier.
    #[arg(long, env = "SEARCH_SEMANTIC_CONFIG", default_value = "default-semantic-configuration")]
    pub search_semantic_config: String,

    /// Vectorizer attached to the vector field of the index.
    #[arg(long, env = "SEARCH_VECTORIZER", default_value = "default-text-vectorizer")]
    pub search_vectorizer: String,

    /// Vector field queried by the vectorizable text query.
    #[arg(long, env = "SEARCH_VECTOR_FIELD", default_value = "text_vector")]
    pub search_vector_field: String,

    /// Number of documents (and nearest neighbours) retrieved per query.
    #[arg(long, env = "RAG_DEFAULT_LIMIT", default_value = "3")]
    pub rag_default_limit: usize,

    // --- General App Args ---
    /// Number of most recent history entries sent with each generation request.
    #[arg(long, env = "HISTORY_WINDOW", default_value = "10")]
    pub history_window: usize,

    /// Optional path to a prompt configuration file overriding the built-in persona and replies.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Timeout in seconds applied to every outbound service request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
