//! Builder for configuring and instantiating model backends.

use std::marker::PhantomData;

use crate::LLMProvider;

/// Fluent configuration shared by every backend.
///
/// Each backend provides its own `build()` on `LLMBuilder<Backend>`, so the
/// set of options it actually honours is decided by the backend.
pub struct LLMBuilder<L: LLMProvider> {
    pub(crate) backend: PhantomData<L>,
    /// API key sent as a bearer token
    pub(crate) api_key: Option<String>,
    /// Base URL of the API, e.g. `http://localhost:11434/v1`
    pub(crate) base_url: Option<String>,
    /// Chat model identifier
    pub model: Option<String>,
    /// Embedding model identifier
    pub embedding_model: Option<String>,
    /// Maximum tokens to generate in a reply
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    pub(crate) timeout_seconds: Option<u64>,
}

impl<L: LLMProvider> Default for LLMBuilder<L> {
    fn default() -> Self {
        Self {
            backend: PhantomData,
            api_key: None,
            base_url: None,
            model: None,
            embedding_model: None,
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        }
    }
}

impl<L: LLMProvider> LLMBuilder<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }
}
