use super::search::{ KnowledgeIndex, SearchDocument, SearchError, SearchRequest, VectorQuery };

use log::{ info, warn, error };
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub const EMPTY_QUERY_SENTINEL: &str = "Please provide a question or topic to search for.";
pub const NO_RESULTS_SENTINEL: &str =
    "No relevant information found about this topic in the knowledge base.";
pub const INDEX_UNAVAILABLE_SENTINEL: &str = "The knowledge base is currently unavailable.";

const SELECT_FIELDS: [&str; 2] = ["title", "chunk"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    SemanticVector,
    VectorOnly,
    PlainText,
}

impl fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalStrategy::SemanticVector => write!(f, "Semantic + Vector"),
            RetrievalStrategy::VectorOnly => write!(f, "Simple Vector"),
            RetrievalStrategy::PlainText => write!(f, "Simple Text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// `None` when the query was blank and no tier ran.
    pub strategy: Option<RetrievalStrategy>,
    pub found: bool,
    pub context: String,
}

#[derive(Debug)]
pub enum TierOutcome {
    Success(Vec<SearchDocument>),
    TierLimitation(String),
    OtherFailure(String),
}

impl From<Result<Vec<SearchDocument>, SearchError>> for TierOutcome {
    fn from(result: Result<Vec<SearchDocument>, SearchError>) -> Self {
        match result {
            Ok(docs) => TierOutcome::Success(docs),
            Err(SearchError::TierLimitation(msg)) => TierOutcome::TierLimitation(msg),
            Err(other) => TierOutcome::OtherFailure(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub top: usize,
    pub semantic_configuration: String,
    pub vectorizer: String,
    pub vector_field: String,
}

#[derive(Clone)]
pub struct KnowledgeRetriever {
    index: Arc<dyn KnowledgeIndex>,
    config: RetrieverConfig,
}

impl KnowledgeRetriever {
    pub fn new(index: Arc<dyn KnowledgeIndex>, config: RetrieverConfig) -> Self {
        Self { index, config }
    }

    fn build_request(&self, strategy: RetrievalStrategy, query: &str) -> SearchRequest {
        let select = SELECT_FIELDS.iter().map(|f| f.to_string()).collect();
        let vector = VectorQuery {
            text: query.to_string(),
            k: self.config.top,
            fields: self.config.vector_field.clone(),
            vectorizer: self.config.vectorizer.clone(),
        };

        match strategy {
            RetrievalStrategy::SemanticVector =>
                SearchRequest {
                    search_text: Some(query.to_string()),
                    top: self.config.top,
                    select,
                    semantic_configuration: Some(self.config.semantic_configuration.clone()),
                    vector: Some(vector),
                },
            RetrievalStrategy::VectorOnly =>
                SearchRequest {
                    search_text: None,
                    top: self.config.top,
                    select,
                    semantic_configuration: None,
                    vector: Some(vector),
                },
            RetrievalStrategy::PlainText =>
                SearchRequest {
                    search_text: Some(query.to_string()),
                    top: self.config.top,
                    select,
                    semantic_configuration: None,
                    vector: None,
                },
        }
    }

    async fn attempt(&self, strategy: RetrievalStrategy, query: &str) -> TierOutcome {
        info!("Attempting {} search for query: '{}'", strategy, query);
        let request = self.build_request(strategy, query);
        self.index.search(&request).await.into()
    }

    pub async fn retrieve(&self, query: &str) -> RetrievalResult {
        if query.trim().is_empty() {
            return RetrievalResult {
                strategy: None,
                found: false,
                context: EMPTY_QUERY_SENTINEL.to_string(),
            };
        }

        let (strategy, mut docs) = match self.attempt(RetrievalStrategy::SemanticVector, query).await {
            TierOutcome::Success(docs) => (RetrievalStrategy::SemanticVector, docs),
            TierOutcome::TierLimitation(msg) => {
                warn!("Semantic + Vector search unsupported ({}). Falling back to vector search.", msg);
                match self.attempt(RetrievalStrategy::VectorOnly, query).await {
                    TierOutcome::Success(docs) => (RetrievalStrategy::VectorOnly, docs),
                    TierOutcome::TierLimitation(msg) | TierOutcome::OtherFailure(msg) => {
                        warn!("Vector search also failed ({}). Falling back to text search.", msg);
                        match self.plain_text(query).await {
                            Some(docs) => (RetrievalStrategy::PlainText, docs),
                            None => return Self::unavailable(),
                        }
                    }
                }
            }
            TierOutcome::OtherFailure(msg) => {
                warn!("Semantic + Vector search failed unexpectedly ({}). Falling back to text search.", msg);
                match self.plain_text(query).await {
                    Some(docs) => (RetrievalStrategy::PlainText, docs),
                    None => return Self::unavailable(),
                }
            }
        };

        info!("{} search returned {} result(s)", strategy, docs.len());
        docs.truncate(self.config.top);

        if docs.is_empty() {
            info!("No results found for query: '{}' using {} search", query, strategy);
            return RetrievalResult {
                strategy: Some(strategy),
                found: false,
                context: NO_RESULTS_SENTINEL.to_string(),
            };
        }

        RetrievalResult {
            strategy: Some(strategy),
            found: true,
            context: format_documents_for_prompt(&docs),
        }
    }

    async fn plain_text(&self, query: &str) -> Option<Vec<SearchDocument>> {
        match self.attempt(RetrievalStrategy::PlainText, query).await {
            TierOutcome::Success(docs) => Some(docs),
            TierOutcome::TierLimitation(msg) | TierOutcome::OtherFailure(msg) => {
                error!("Text search failed: {}", msg);
                None
            }
        }
    }

    fn unavailable() -> RetrievalResult {
        RetrievalResult {
            strategy: None,
            found: false,
            context: INDEX_UNAVAILABLE_SENTINEL.to_string(),
        }
    }
}

fn field_text(doc: &SearchDocument, key: &str) -> String {
    match doc.get(key) {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn format_documents_for_prompt(docs: &[SearchDocument]) -> String {
    let mut docs_text = String::new();
    for doc in docs {
        docs_text.push_str(&format!("Title: {}\n", field_text(doc, "title")));
        docs_text.push_str(&format!("Content: {}\n", field_text(doc, "chunk")));
        docs_text.push_str("---\n");
    }
    docs_text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ doc, ScriptedIndex };

    fn retriever(index: Arc<ScriptedIndex>) -> KnowledgeRetriever {
        KnowledgeRetriever::new(index, RetrieverConfig {
            top: 3,
            semantic_configuration: "sem-config".into(),
            vectorizer: "text-vectorizer".into(),
            vector_field: "text_vector".into(),
        })
    }

    fn limitation() -> SearchError {
        SearchError::TierLimitation("semantic ranker not enabled".into())
    }

    #[tokio::test]
    async fn blank_query_short_circuits() {
        let index = Arc::new(ScriptedIndex::new(vec![]));
        let result = retriever(index.clone()).retrieve("   ").await;

        assert_eq!(result.context, EMPTY_QUERY_SENTINEL);
        assert_eq!(result.strategy, None);
        assert!(index.requests().is_empty());
    }

    #[tokio::test]
    async fn semantic_tier_success_formats_blocks() {
        let index = Arc::new(
            ScriptedIndex::new(vec![Ok(vec![doc(Some("Venue"), Some("The old mill."))])])
        );
        let result = retriever(index.clone()).retrieve("Where is the venue?").await;

        assert_eq!(result.strategy, Some(RetrievalStrategy::SemanticVector));
        assert!(result.found);
        assert_eq!(result.context, "Title: Venue\nContent: The old mill.\n---\n");

        let requests = index.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].semantic_configuration.as_deref(), Some("sem-config"));
        assert_eq!(requests[0].top, 3);
        assert_eq!(requests[0].select, vec!["title".to_string(), "chunk".to_string()]);
        let vector = requests[0].vector.as_ref().unwrap();
        assert_eq!(vector.k, 3);
        assert_eq!(vector.vectorizer, "text-vectorizer");
    }

    #[tokio::test]
    async fn tier_limitation_falls_back_to_vector_only() {
        let index = Arc::new(
            ScriptedIndex::new(
                vec![
                    Err(limitation()),
                    Ok(vec![doc(Some("A"), Some("one")), doc(Some("B"), Some("two"))])
                ]
            )
        );
        let result = retriever(index.clone()).retrieve("dress code").await;

        assert_eq!(result.strategy, Some(RetrievalStrategy::VectorOnly));
        assert_eq!(result.context.matches("---\n").count(), 2);

        let requests = index.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].search_text, None);
        assert_eq!(requests[1].semantic_configuration, None);
        assert_eq!(requests[1].vector.as_ref().unwrap().vectorizer, "text-vectorizer");
    }

    #[tokio::test]
    async fn vector_failure_falls_back_to_plain_text_sentinel() {
        let index = Arc::new(
            ScriptedIndex::new(
                vec![
                    Err(limitation()),
                    Err(SearchError::Transport("connection reset".into())),
                    Ok(vec![])
                ]
            )
        );
        let result = retriever(index.clone()).retrieve("parking").await;

        assert_eq!(result.strategy, Some(RetrievalStrategy::PlainText));
        assert!(!result.found);
        assert_eq!(result.context, NO_RESULTS_SENTINEL);

        let requests = index.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].search_text.as_deref(), Some("parking"));
        assert!(requests[2].vector.is_none());
        assert!(requests[2].semantic_configuration.is_none());
    }

    #[tokio::test]
    async fn unexpected_failure_skips_vector_tier() {
        let index = Arc::new(
            ScriptedIndex::new(
                vec![
                    Err(SearchError::Service { status: 503, message: "busy".into() }),
                    Ok(vec![doc(Some("Menu"), Some("Three courses."))])
                ]
            )
        );
        let result = retriever(index.clone()).retrieve("menu").await;

        assert_eq!(result.strategy, Some(RetrievalStrategy::PlainText));
        assert!(result.found);
        assert_eq!(index.requests().len(), 2);
    }

    #[tokio::test]
    async fn all_tiers_failing_yields_unavailable_sentinel() {
        let index = Arc::new(
            ScriptedIndex::new(
                vec![
                    Err(SearchError::Transport("dns".into())),
                    Err(SearchError::Transport("dns".into()))
                ]
            )
        );
        let result = retriever(index).retrieve("menu").await;

        assert_eq!(result.context, INDEX_UNAVAILABLE_SENTINEL);
        assert!(!result.found);
    }

    #[tokio::test]
    async fn results_beyond_top_are_dropped() {
        let docs = (1..=5).map(|i| doc(Some(&format!("Doc {}", i)), Some("text"))).collect();
        let index = Arc::new(ScriptedIndex::new(vec![Ok(docs)]));
        let result = retriever(index).retrieve("Is there parking?").await;

        assert!(result.found);
        assert_eq!(result.context.matches("---\n").count(), 3);
        assert!(result.context.contains("Title: Doc 3\n"));
        assert!(!result.context.contains("Doc 4"));
    }

    #[test]
    fn missing_fields_render_as_na() {
        let docs = vec![doc(None, Some("body")), doc(Some("Only title"), None)];
        assert_eq!(
            format_documents_for_prompt(&docs),
            "Title: N/A\nContent: body\n---\nTitle: Only title\nContent: N/A\n---\n"
        );
    }
}
