use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, StatusCode, header::{ HeaderMap, HeaderValue, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub type SearchDocument = Map<String, Value>;

/// Error codes the search service uses when the provisioned tier lacks
/// semantic ranking or integrated vectorization.
const TIER_LIMITATION_CODES: &[&str] = &[
    "SemanticQueriesNotAvailable",
    "SemanticSearchNotEnabled",
    "SemanticConfigurationNotFound",
    "VectorizerNotFound",
    "VectorizationNotSupported",
];

const TIER_LIMITATION_MARKERS: &[&str] = &["semantic configuration", "semantic ranker", "vectorizer"];

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search tier not supported by the service: {0}")]
    TierLimitation(String),
    #[error("search service returned {status}: {message}")]
    Service {
        status: u16,
        message: String,
    },
    #[error("search request failed: {0}")]
    Transport(String),
    #[error("failed to decode search response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub text: String,
    pub k: usize,
    pub fields: String,
    /// Logged only; the index binds the vectorizer to `fields`.
    pub vectorizer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub search_text: Option<String>,
    pub top: usize,
    pub select: Vec<String>,
    pub semantic_configuration: Option<String>,
    pub vector: Option<VectorQuery>,
}

#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchDocument>, SearchError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    top: usize,
    select: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    semantic_configuration: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    vector_queries: Vec<VectorQueryBody<'a>>,
}

#[derive(Serialize)]
struct VectorQueryBody<'a> {
    kind: &'a str,
    text: &'a str,
    k: usize,
    fields: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchDocument>,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    error: ServiceErrorDetail,
}

#[derive(Deserialize)]
struct ServiceErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

impl<'a> From<&'a SearchRequest> for SearchBody<'a> {
    fn from(req: &'a SearchRequest) -> Self {
        let semantic_configuration = req.semantic_configuration.as_deref();
        // The vectorizer is bound to the vector field in the index definition;
        // the REST body only names the field to vectorize against.
        let vector_queries = req.vector
            .iter()
            .map(|v| VectorQueryBody {
                kind: "text",
                text: &v.text,
                k: v.k,
                fields: &v.fields,
            })
            .collect();

        Self {
            search: req.search_text.as_deref(),
            top: req.top,
            select: req.select.join(","),
            query_type: semantic_configuration.map(|_| "semantic"),
            semantic_configuration,
            vector_queries,
        }
    }
}

/// Maps an error response from the search service onto [`SearchError`].
///
/// Structured error codes are checked first. When none of the known codes is
/// present the message text is matched against the phrases the service uses
/// for unsupported semantic or vectorizer features.
pub fn classify_service_error(status: StatusCode, body: &str) -> SearchError {
    let (code, message) = match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(parsed) => (parsed.error.code, parsed.error.message),
        Err(_) => (None, body.to_string()),
    };

    if status == StatusCode::BAD_REQUEST {
        let known_code = code
            .as_deref()
            .map(|c| TIER_LIMITATION_CODES.iter().any(|k| k.eq_ignore_ascii_case(c)))
            .unwrap_or(false);
        let lower = message.to_lowercase();
        let known_message = TIER_LIMITATION_MARKERS.iter().any(|m| lower.contains(m));
        if known_code || known_message {
            return SearchError::TierLimitation(message);
        }
    }

    SearchError::Service { status: status.as_u16(), message }
}

pub struct AzureSearchClient {
    http: HttpClient,
    search_url: Url,
}

impl AzureSearchClient {
    pub fn new(
        endpoint: &str,
        index_name: &str,
        api_key: &str,
        api_version: &str,
        timeout: Duration
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut search_url = Url::parse(
            &format!("{}/indexes/{}/docs/search", endpoint.trim_end_matches('/'), index_name)
        ).map_err(|e| format!("Invalid search endpoint '{}': {}", endpoint, e))?;
        search_url.query_pairs_mut().append_pair("api-version", api_version);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "api-key",
            HeaderValue::from_str(api_key).map_err(|e| format!("Invalid search API key format: {}", e))?
        );

        let http = HttpClient::builder().default_headers(headers).timeout(timeout).build()?;

        Ok(Self { http, search_url })
    }
}

#[async_trait]
impl KnowledgeIndex for AzureSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchDocument>, SearchError> {
        let body = SearchBody::from(request);
        debug!(
            "Search request: semantic={:?}, vectorizer={:?}",
            request.semantic_configuration,
            request.vector.as_ref().map(|v| v.vectorizer.as_str())
        );

        let resp = self.http
            .post(self.search_url.clone())
            .json(&body)
            .send().await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_service_error(status, &text));
        }

        let parsed = resp
            .json::<SearchResponse>().await
            .map_err(|e| SearchError::Decode(e.to_string()))?;
        Ok(parsed.value)
    }
}
