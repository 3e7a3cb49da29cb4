//! Client for any server speaking the OpenAI chat-completions and embeddings
//! wire format (vLLM, Ollama, llama.cpp server, TEI, hosted APIs).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::LLMProvider;
use crate::builder::LLMBuilder;
use crate::chat::{ChatMessage, ChatProvider, ChatResponse, TextResponse};
use crate::embedding::EmbeddingProvider;
use crate::error::LLMError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_MODEL: &str = "mistral-small3.2";
pub const DEFAULT_EMBEDDING_MODEL: &str = "trmteb/turkish-embedding-model";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// OpenAI-compatible chat and embedding client.
#[derive(Debug, Clone)]
pub struct OpenAICompatible {
    client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) embedding_model: String,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) temperature: Option<f32>,
}

impl OpenAICompatible {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
        embedding_model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, LLMError> {
        let timeout = Duration::from_secs(timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::HttpError(e.to_string()))?;

        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embedding_model: embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            max_tokens,
            temperature,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, LLMError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        log::debug!("POST {url}");

        let response = self
            .authorize(self.client.post(&url).json(body))
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(LLMError::AuthError(format!("{status}: {raw}")));
        }
        if !status.is_success() {
            return Err(LLMError::ProviderError(format!("{status}: {raw}")));
        }

        serde_json::from_str(&raw).map_err(|e| LLMError::response_format(e, raw))
    }
}

#[async_trait]
impl ChatProvider for OpenAICompatible {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let completion: ChatCompletionResponse =
            self.post_json("chat/completions", &request).await?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::response_format("no choices returned", String::new()))?
            .message
            .content
            .unwrap_or_default();

        Ok(Box::new(TextResponse::new(text)))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAICompatible {
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: &input,
        };
        let mut response: EmbeddingResponse = self.post_json("embeddings", &request).await?;

        if response.data.len() != input.len() {
            return Err(LLMError::response_format(
                format!(
                    "expected {} embeddings, got {}",
                    input.len(),
                    response.data.len()
                ),
                String::new(),
            ));
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl LLMProvider for OpenAICompatible {}

impl LLMBuilder<OpenAICompatible> {
    pub fn build(self) -> Result<Arc<OpenAICompatible>, LLMError> {
        let provider = OpenAICompatible::new(
            self.base_url,
            self.api_key,
            self.model,
            self.embedding_model,
            self.max_tokens,
            self.temperature,
            self.timeout_seconds,
        )?;
        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let client = OpenAICompatible::new(None, None, None, None, None, None, None).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.embedding_model(), DEFAULT_EMBEDDING_MODEL);
        assert!(client.api_key.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let client = LLMBuilder::<OpenAICompatible>::new()
            .base_url("http://example.com/v9/")
            .api_key("key")
            .model("custom")
            .embedding_model("embedder")
            .max_tokens(111)
            .temperature(0.3)
            .timeout_seconds(9)
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://example.com/v9");
        assert_eq!(client.model(), "custom");
        assert_eq!(client.embedding_model(), "embedder");
        assert_eq!(client.max_tokens, Some(111));
        assert_eq!(client.temperature, Some(0.3));
        assert_eq!(client.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_empty_api_key_is_dropped() {
        let client =
            OpenAICompatible::new(None, Some(String::new()), None, None, None, None, None).unwrap();
        assert!(client.api_key.is_none());
    }

    #[test]
    fn test_endpoint_join() {
        let client = OpenAICompatible::new(
            Some("http://host/v1/".to_string()),
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(client.endpoint("embeddings"), "http://host/v1/embeddings");
    }
}
