use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use teleagent_llm::ChatProvider;

use super::error::AgentError;
use super::operation_processor::OperationProcessor;
use super::state::{DecisionState, ToolCallRecord, TurnOutcome, TurnStatus};
use super::ConversationAgent;
use crate::action::{ActionObject, parse_actions};
use crate::config::{AgentSettings, DEFAULT_LOOP_LIMIT_MESSAGE, DEFAULT_MAX_STEPS};
use crate::operation::{OperationRegistry, OperationResult};
use crate::prompt::{DEFAULT_SYSTEM_PROMPT, render_system_prompt};
use crate::session::ConversationSession;

const MALFORMED_REPLY_ERROR: &str = "Reply did not contain a valid action. Respond with exactly one JSON object with the fields thought, action and action_input.";

/// Drives the decide, execute and observe loop for one user turn at a time.
///
/// The dispatcher holds no per-conversation state; history lives in the
/// [`ConversationSession`] passed to [`Dispatcher::run_turn`].
pub struct Dispatcher {
    registry: Arc<OperationRegistry>,
    llm: Arc<dyn ChatProvider>,
    system_prompt: String,
    max_steps: usize,
    loop_limit_message: String,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(registry: Arc<OperationRegistry>, llm: Arc<dyn ChatProvider>) -> Self {
        let system_prompt = render_system_prompt(DEFAULT_SYSTEM_PROMPT, &registry);
        Self {
            registry,
            llm,
            system_prompt,
            max_steps: DEFAULT_MAX_STEPS,
            loop_limit_message: DEFAULT_LOOP_LIMIT_MESSAGE.to_string(),
        }
    }

    pub fn from_settings(
        registry: Arc<OperationRegistry>,
        llm: Arc<dyn ChatProvider>,
        settings: &AgentSettings,
    ) -> Result<Self, AgentError> {
        if settings.max_steps == 0 {
            return Err(AgentError::Configuration(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(Self::new(registry, llm)
            .with_system_prompt_template(&settings.system_prompt)
            .with_max_steps(settings.max_steps)
            .with_loop_limit_message(settings.loop_limit_message.clone()))
    }

    /// Replace the prompt template; placeholders are filled from the registry.
    pub fn with_system_prompt_template(mut self, template: &str) -> Self {
        self.system_prompt = render_system_prompt(template, &self.registry);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_loop_limit_message(mut self, message: impl Into<String>) -> Self {
        self.loop_limit_message = message.into();
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Run one user turn to completion.
    ///
    /// Only a failing model call returns `Err`. Validation failures,
    /// operation errors and the step guardrail all end in an `Ok` outcome.
    pub async fn run_turn(
        &self,
        session: &mut ConversationSession,
        input: &str,
    ) -> Result<TurnOutcome, AgentError> {
        session.push_user(input);

        let mut state = DecisionState::AwaitingDecision;
        let mut steps = 0usize;
        let mut reply = String::new();
        let mut transcript = Vec::new();
        let mut tool_calls = Vec::new();

        loop {
            state = match state {
                DecisionState::AwaitingDecision => {
                    let raw = self.decide(session).await?;
                    transcript.push(raw.clone());
                    match self.live_action(&raw) {
                        Some(action) if action.is_final_answer() => {
                            DecisionState::FinalAnswer(action)
                        }
                        decision if steps >= self.max_steps => {
                            DecisionState::LoopLimitExceeded(decision)
                        }
                        Some(action) => DecisionState::ToolInvoked(action),
                        None => DecisionState::Malformed(raw),
                    }
                }
                DecisionState::ToolInvoked(action) => {
                    steps += 1;
                    info!("Step {steps}/{}: dispatching '{}'", self.max_steps, action.action);
                    let result = OperationProcessor::execute(&self.registry, &action);
                    session.push_assistant(action.to_json_string());
                    session.push_tool_result(result.to_json_string());
                    tool_calls.push(ToolCallRecord { action, result });
                    DecisionState::AwaitingDecision
                }
                DecisionState::Malformed(raw) => {
                    steps += 1;
                    warn!("Step {steps}/{}: model reply carried no usable action", self.max_steps);
                    session.push_assistant(raw);
                    session.push_tool_result(
                        OperationResult::failure(MALFORMED_REPLY_ERROR).to_json_string(),
                    );
                    DecisionState::AwaitingDecision
                }
                DecisionState::FinalAnswer(action) => {
                    reply = action.input_text();
                    session.push_assistant(reply.clone());
                    DecisionState::TurnComplete(TurnStatus::Completed)
                }
                DecisionState::LoopLimitExceeded(pending) => {
                    let requested = pending.map(|a| a.action).unwrap_or_default();
                    warn!(
                        "Step limit of {} reached; not executing '{requested}'",
                        self.max_steps
                    );
                    reply = self.loop_limit_message.clone();
                    session.push_assistant(reply.clone());
                    DecisionState::TurnComplete(TurnStatus::LoopLimitExceeded)
                }
                DecisionState::TurnComplete(status) => {
                    return Ok(TurnOutcome {
                        reply,
                        status,
                        steps,
                        transcript,
                        tool_calls,
                    });
                }
            };
        }
    }

    async fn decide(&self, session: &ConversationSession) -> Result<String, AgentError> {
        let messages = session.to_chat_messages(&self.system_prompt);
        let response = self.llm.chat(&messages).await?;
        let raw = response.text().unwrap_or_default();
        debug!("Model output: {raw}");
        Ok(raw)
    }

    /// First action of the reply; any further actions are ignored.
    fn live_action(&self, raw: &str) -> Option<ActionObject> {
        let mut actions = parse_actions(raw).into_iter();
        let first = actions.next()?;
        let ignored = actions.count();
        if ignored > 0 {
            warn!("Model emitted {} actions; ignoring all but '{}'", ignored + 1, first.action);
        }
        Some(first)
    }
}

#[async_trait]
impl ConversationAgent for Dispatcher {
    async fn respond(
        &self,
        session: &mut ConversationSession,
        input: &str,
    ) -> Result<TurnOutcome, AgentError> {
        self.run_turn(session, input).await
    }
}
