//! Recovery of JSON action objects from free-form model output.
//!
//! The scanner counts braces literally, including braces that appear inside
//! JSON string values. A value such as `"a } b"` can therefore close an object
//! early; the truncated candidate fails to parse and is dropped.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved `action` value marking a terminal decision.
pub const FINAL_ANSWER: &str = "Final Answer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ToolCall,
    FinalAnswer,
}

/// One decision emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionObject {
    #[serde(default)]
    pub thought: String,
    pub action: String,
    #[serde(default)]
    pub action_input: Value,
}

impl ActionObject {
    pub fn tool_call(
        thought: impl Into<String>,
        action: impl Into<String>,
        action_input: Value,
    ) -> Self {
        Self {
            thought: thought.into(),
            action: action.into(),
            action_input,
        }
    }

    pub fn final_answer(thought: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            action: FINAL_ANSWER.to_string(),
            action_input: Value::String(answer.into()),
        }
    }

    /// Classify a recovered JSON value. Returns `None` when `action` is
    /// missing, not a string or blank.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let action = obj.get("action")?.as_str()?.trim();
        if action.is_empty() {
            return None;
        }

        Some(Self {
            thought: obj.get("thought").map(to_text).unwrap_or_default(),
            action: action.to_string(),
            action_input: obj.get("action_input").cloned().unwrap_or(Value::Null),
        })
    }

    pub fn kind(&self) -> ActionKind {
        if self.is_final_answer() {
            ActionKind::FinalAnswer
        } else {
            ActionKind::ToolCall
        }
    }

    pub fn is_final_answer(&self) -> bool {
        normalize_name(&self.action) == normalize_name(FINAL_ANSWER)
    }

    /// Text form of `action_input`.
    pub fn input_text(&self) -> String {
        to_text(&self.action_input)
    }

    pub fn to_json_string(&self) -> String {
        serde_json::json!({
            "thought": self.thought,
            "action": self.action,
            "action_input": self.action_input,
        })
        .to_string()
    }
}

impl fmt::Display for ActionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

/// `null` becomes empty, strings are kept verbatim, anything else is
/// rendered as compact JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Trimmed, lowercased name used for every operation-name comparison.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Every balanced `{...}` block in `text` that parses as JSON, in order.
pub fn extract_json_objects(text: &str) -> Vec<Value> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, ch) in text.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..=i];
                    match serde_json::from_str::<Value>(candidate) {
                        Ok(value) => objects.push(value),
                        Err(err) => debug!("dropping unparsable JSON candidate: {err}"),
                    }
                }
            }
            _ => {}
        }
    }

    objects
}

/// Extract every usable action from `text`, preserving emission order.
pub fn parse_actions(text: &str) -> Vec<ActionObject> {
    extract_json_objects(text)
        .iter()
        .filter_map(|value| {
            let action = ActionObject::from_value(value);
            if action.is_none() {
                debug!("discarding JSON object without a usable action: {value}");
            }
            action
        })
        .collect()
}
