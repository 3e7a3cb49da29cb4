//! The action protocol state machine.

use async_trait::async_trait;

mod dispatcher;
mod error;
mod operation_processor;
mod state;

pub use dispatcher::Dispatcher;
pub use error::AgentError;
pub use operation_processor::OperationProcessor;
pub use state::{DecisionState, ToolCallRecord, TurnOutcome, TurnStatus};

use crate::session::ConversationSession;

/// Anything that can answer a user turn on a session.
#[async_trait]
pub trait ConversationAgent: Send + Sync {
    async fn respond(
        &self,
        session: &mut ConversationSession,
        input: &str,
    ) -> Result<TurnOutcome, AgentError>;
}
