use teleagent_llm::LLMError;
use thiserror::Error;

/// Failures that abort a user turn. Anything the model can recover from is
/// fed back to it as a tool result instead.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LLMError(#[from] LLMError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}
