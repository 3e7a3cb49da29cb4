
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use teleagent_llm::chat::TextResponse;
use teleagent_llm::{ChatMessage, ChatProvider, ChatResponse, LLMError};

use crate::operation::{
    OperationError, OperationRegistry, OperationResult, OperationSpec, ParamKind, ParamSpec,
    from_fn,
};

/// Replays queued replies; an exhausted queue is a provider error.
pub(crate) struct MockChat {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub(crate) received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChat {
    pub(crate) fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err("model offline".to_string())])),
            received: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for MockChat {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        self.received.lock().unwrap().push(messages.to_vec());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(Box::new(TextResponse::new(text))),
            Some(Err(err)) => Err(LLMError::ProviderError(err)),
            None => Err(LLMError::ProviderError("no scripted reply left".to_string())),
        }
    }
}

pub(crate) fn tool_call(action: &str, input: serde_json::Value) -> String {
    json!({"thought": "calling", "action": action, "action_input": input}).to_string()
}

pub(crate) fn final_answer(text: &str) -> String {
    json!({"thought": "done", "action": "Final Answer", "action_input": text}).to_string()
}

/// Registry with a counting `getUserInfo`, a failing `getBillDetails` and a
/// panicking `activateEsim`.
pub(crate) fn test_registry(calls: Arc<AtomicUsize>) -> OperationRegistry {
    let mut registry = OperationRegistry::new();
    registry
        .register(from_fn(
            OperationSpec::new("getUserInfo", "Look up a subscriber").with_param(
                ParamSpec::required("user_identifier", ParamKind::String, "Id"),
            ),
            move |args| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(OperationResult::ok()
                    .with_data(json!({"name": "Ayşe", "id": args.str("user_identifier")})))
            },
        ))
        .unwrap();
    registry
        .register(from_fn(
            OperationSpec::new("getBillDetails", "List bills").with_param(ParamSpec::required(
                "user_identifier",
                ParamKind::String,
                "Id",
            )),
            |_| Err(OperationError::runtime("billing backend timeout")),
        ))
        .unwrap();
    registry
        .register(from_fn(OperationSpec::new("activateEsim", "Activate"), |_| {
            panic!("esim provisioning crashed")
        }))
        .unwrap();
    registry
}
