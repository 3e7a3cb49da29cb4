use std::fmt;

use serde::{Deserialize, Serialize};
use teleagent_llm::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
            Role::ToolResult => f.write_str("tool_result"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Ordered history of one chat or one scenario replay.
///
/// Turns can only be appended; nothing is ever rewritten or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationSession {
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    pub fn push_tool_result(&mut self, content: impl Into<String>) {
        self.push(Role::ToolResult, content);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the history for the model. Tool results have no chat role of
    /// their own and are sent as user messages wrapping the observation in a
    /// JSON code fence.
    pub fn to_chat_messages(&self, system_prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        for turn in &self.turns {
            let message = match turn.role {
                Role::User => ChatMessage::user(turn.content.clone()),
                Role::Assistant => ChatMessage::assistant(turn.content.clone()),
                Role::ToolResult => ChatMessage::user(render_observation(&turn.content)),
            };
            messages.push(message);
        }
        messages
    }
}

pub fn render_observation(observation: &str) -> String {
    format!("```json\n{observation}\n```")
}

#[cfg(test)]
mod tests {
    use super::*;
    use teleagent_llm::ChatRole;

    #[test]
    fn test_turns_are_appended_in_order() {
        let mut session = ConversationSession::new();
        session.push_user("Faturamı görmek istiyorum");
        session.push_assistant(r#"{"action":"getBillDetails"}"#);
        session.push_tool_result(r#"{"success":true}"#);

        let roles: Vec<Role> = session.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::ToolResult]);
        assert_eq!(session.last().unwrap().content, r#"{"success":true}"#);
    }

    #[test]
    fn test_chat_rendering() {
        let mut session = ConversationSession::new();
        session.push_user("hello");
        session.push_assistant("{}");
        session.push_tool_result(r#"{"success":false}"#);

        let messages = session.to_chat_messages("SYSTEM");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[0].content, "SYSTEM");
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[3].role, ChatRole::User);
        assert_eq!(messages[3].content, "```json\n{\"success\":false}\n```");
    }
}
