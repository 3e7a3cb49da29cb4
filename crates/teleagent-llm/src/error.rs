use std::fmt;

/// Errors raised at the model boundary.
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    /// Transport level failure (connect, timeout, non-2xx status).
    #[error("HTTP Error: {0}")]
    HttpError(String),

    #[error("Auth Error: {0}")]
    AuthError(String),

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Provider Error: {0}")]
    ProviderError(String),

    /// The provider answered, but not in the shape we expected.
    #[error("Response Format Error: {message}. Raw response: {raw_response}")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },

    #[error("JSON Parse Error: {0}")]
    JsonError(String),
}

impl LLMError {
    pub fn response_format(message: impl fmt::Display, raw_response: impl Into<String>) -> Self {
        Self::ResponseFormatError {
            message: message.to_string(),
            raw_response: raw_response.into(),
        }
    }
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().is_some_and(|s| s.as_u16() == 401 || s.as_u16() == 403) {
            LLMError::AuthError(err.to_string())
        } else {
            LLMError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        LLMError::JsonError(err.to_string())
    }
}
