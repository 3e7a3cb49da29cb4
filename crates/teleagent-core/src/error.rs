use teleagent_llm::LLMError;
use thiserror::Error;

use crate::agent::AgentError;
use crate::config::ConfigError;
use crate::operation::{OperationError, RegistryError, ValidationError};

/// Error type covering every failure surfaced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    LLM(#[from] LLMError),
}
