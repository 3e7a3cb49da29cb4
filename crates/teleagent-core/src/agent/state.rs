use serde::{Deserialize, Serialize};

use crate::action::ActionObject;
use crate::operation::OperationResult;

/// Position of the dispatcher within one user turn.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionState {
    /// Waiting for the model to emit its next decision.
    AwaitingDecision,
    /// The model asked for an operation; it has not run yet.
    ToolInvoked(ActionObject),
    /// The reply carried no usable action object.
    Malformed(String),
    FinalAnswer(ActionObject),
    /// The step budget is spent and the model asked for another cycle.
    LoopLimitExceeded(Option<ActionObject>),
    TurnComplete(TurnStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Completed,
    LoopLimitExceeded,
}

/// One executed operation and what it returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub action: ActionObject,
    pub result: OperationResult,
}

/// Everything one user turn produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub status: TurnStatus,
    /// Non-terminal cycles consumed, including malformed replies.
    pub steps: usize,
    /// Raw model output, one entry per model call.
    pub transcript: Vec<String>,
    pub tool_calls: Vec<ToolCallRecord>,
}

impl TurnOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == TurnStatus::Completed
    }

    /// All model text of the turn joined with newlines.
    pub fn transcript_text(&self) -> String {
        self.transcript.join("\n")
    }
}
