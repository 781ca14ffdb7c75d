use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;

use super::{ ChatClient, ChatRequest, ChatRole, CompletionResponse };
use crate::llm::{ LlmConfig, LlmType };

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    completions_url: String,
    azure: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: ChatRole,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    /// Azure routes by deployment in the URL and ignores the body model.
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

impl OpenAIChatClient {
    pub fn new(
        llm_type: &LlmType,
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        api_version: Option<String>,
        timeout: std::time::Duration
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let (model, base_url, completions_url, azure) = match llm_type {
            LlmType::AzureOpenAI => {
                let deployment = model.ok_or_else(||
                    "Azure OpenAI deployment name (CHAT_MODEL) is required".to_string()
                )?;
                let endpoint = base_url.ok_or_else(||
                    "Azure OpenAI endpoint (CHAT_BASE_URL) is required".to_string()
                )?;
                let version = api_version.unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
                let url = format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint.trim_end_matches('/'),
                    deployment,
                    version
                );
                headers.insert(
                    "api-key",
                    HeaderValue::from_str(&api_key).map_err(|e| format!("Invalid API key format: {}", e))?
                );
                (deployment, endpoint, url, true)
            }
            LlmType::OpenAI => {
                let chat_model = model.unwrap_or_else(|| "gpt-4o".to_string());
                let api_url = base_url.unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
                let url = format!("{}/v1/chat/completions", api_url.trim_end_matches('/'));
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
                        format!("Invalid API key format: {}", e)
                    )?
                );
                (chat_model, api_url, url, false)
            }
        };

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self { http, model, base_url, completions_url, azure })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key.clone().ok_or_else(|| "Chat API key is required".to_string())?;

        Self::new(
            &config.llm_type,
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.api_version.clone(),
            config.timeout
        )
    }

    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    fn build_request(&self, request: &ChatRequest) -> OpenAIChatRequest {
        OpenAIChatRequest {
            model: if self.azure { None } else { Some(self.model.clone()) },
            messages: request.messages
                .iter()
                .map(|m| OpenAIMessage { role: m.role, content: Some(m.content.clone()) })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete_chat(
        &self,
        request: &ChatRequest
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let req = self.build_request(request);
        debug!("Sending {} message(s) to {}", req.messages.len(), self.model);

        let resp = self.http
            .post(&self.completions_url)
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<OpenAIResponse>().await?;

        let content = resp.choices.into_iter().next().and_then(|c| c.message.content);

        Ok(CompletionResponse { response: content })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
