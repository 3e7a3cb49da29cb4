use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};
use teleagent_llm::chat::TextResponse;
use teleagent_llm::{ChatMessage, ChatProvider, ChatResponse, EmbeddingProvider, LLMError};

#[derive(Debug, Clone)]
enum ScriptedReply {
    Text(String),
    Fail(String),
}

/// Chat provider that replays a fixed script.
///
/// Each call pops the next entry. Running past the end is a provider error.
#[derive(Debug, Default)]
pub struct ScriptedChatProvider {
    script: Mutex<VecDeque<ScriptedReply>>,
    received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::default();
        for reply in replies {
            provider.push_reply(reply);
        }
        provider
    }

    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.push_reply(reply);
        self
    }

    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.lock_script()
            .push_back(ScriptedReply::Fail(message.into()));
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_script()
            .push_back(ScriptedReply::Text(reply.into()));
    }

    /// Every message list this provider was called with, in call order.
    pub fn received(&self) -> Vec<Vec<ChatMessage>> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.received.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.lock_script().len()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedReply>> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatProvider for ScriptedChatProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        if let Ok(mut received) = self.received.lock() {
            received.push(messages.to_vec());
        }
        match self.lock_script().pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(Box::new(TextResponse::new(text))),
            Some(ScriptedReply::Fail(message)) => Err(LLMError::ProviderError(message)),
            None => Err(LLMError::ProviderError(
                "scripted provider has no replies left".to_string(),
            )),
        }
    }
}

/// Embedding provider that always fails.
#[derive(Debug, Default, Clone)]
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        Err(LLMError::HttpError("embedding endpoint unavailable".to_string()))
    }
}

pub fn tool_call_reply(action: &str, input: Value) -> String {
    json!({
        "thought": format!("I need to call {action}."),
        "action": action,
        "action_input": input,
    })
    .to_string()
}

pub fn final_answer_reply(answer: &str) -> String {
    json!({
        "thought": "I can answer now.",
        "action": "Final Answer",
        "action_input": answer,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_is_replayed_in_order() {
        let provider = ScriptedChatProvider::new(["one"]).then_fail("down").then_reply("two");

        let first = provider.chat(&[ChatMessage::user("a")]).await.unwrap();
        assert_eq!(first.text().as_deref(), Some("one"));
        assert!(provider.chat(&[]).await.is_err());
        let third = provider.chat(&[]).await.unwrap();
        assert_eq!(third.text().as_deref(), Some("two"));
        assert!(provider.chat(&[]).await.is_err());

        assert_eq!(provider.calls(), 4);
        assert_eq!(provider.received()[0][0].content, "a");
    }

    #[tokio::test]
    async fn test_failing_embedder() {
        assert!(FailingEmbedder.embed(vec!["x".to_string()]).await.is_err());
    }
}
