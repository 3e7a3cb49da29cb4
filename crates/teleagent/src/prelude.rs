//! Common types for wiring an operator agent together.

// Agent loop
pub use crate::core::agent::{
    AgentError, ConversationAgent, Dispatcher, TurnOutcome, TurnStatus,
};
pub use crate::core::session::{ConversationSession, Role, Turn};

// Operations
pub use crate::core::operation::{
    Operation, OperationError, OperationRegistry, OperationResult, OperationSpec, ParamKind,
    ParamSpec, ValidatedArgs,
};

// Configuration and errors
pub use crate::core::config::Settings;
pub use crate::core::error::Error;

// LLM abstractions
pub use crate::llm::builder::LLMBuilder;
pub use crate::llm::embedding::LexicalEmbedder;
pub use crate::llm::{ChatProvider, EmbeddingProvider, LLMProvider};

// Evaluation
pub use crate::kpi::{KpiEvaluator, ReportRow, Scenario};

// Telecom catalog
pub use crate::telecom::{SubscriberStore, telecom_registry};

// Utils
pub use crate::init_logging;
