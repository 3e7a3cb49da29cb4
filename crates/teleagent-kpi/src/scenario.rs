use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use teleagent_core::action::{ActionObject, parse_actions};

use crate::error::ScenarioError;

pub const DEFAULT_SCENARIO_ID: &str = "SCENARIO";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ScenarioStep {
    pub fn is_user(&self) -> bool {
        self.role == "user"
    }

    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }
}

/// A scripted conversation with its reference assistant replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: Option<String>,
    #[serde(default)]
    pub conversations: Vec<ScenarioStep>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub critical_steps: Vec<String>,
}

/// Reference behaviour recovered from a scenario.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoldStandard {
    /// Operation names found in the assistant steps, in order.
    pub tools: Vec<String>,
    pub finals: Vec<ActionObject>,
}

impl Scenario {
    /// `id`, else `name`, else a fixed placeholder. Blank values are skipped.
    pub fn display_id(&self) -> &str {
        [&self.id, &self.name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCENARIO_ID)
    }

    pub fn user_messages(&self) -> impl Iterator<Item = &str> {
        self.conversations
            .iter()
            .filter(|s| s.is_user())
            .map(|s| s.content.as_str())
    }

    pub fn gold(&self) -> GoldStandard {
        let mut gold = GoldStandard::default();
        for step in self.conversations.iter().filter(|s| s.is_assistant()) {
            for action in parse_actions(&step.content) {
                if action.is_final_answer() {
                    gold.finals.push(action);
                } else {
                    gold.tools.push(action.action);
                }
            }
        }
        gold
    }

    /// `critical_steps` when present, otherwise the tools of the gold replies.
    pub fn expected_tools(&self, gold: &GoldStandard) -> Vec<String> {
        if self.critical_steps.is_empty() {
            gold.tools.clone()
        } else {
            self.critical_steps.clone()
        }
    }
}

/// Read a scenario file holding either one scenario or an array of them.
///
/// A leading BOM is skipped and invalid UTF-8 sequences are replaced.
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> Result<Vec<Scenario>, ScenarioError> {
    let bytes = std::fs::read(path)?;
    parse_scenarios(&bytes)
}

pub fn parse_scenarios(bytes: &[u8]) -> Result<Vec<Scenario>, ScenarioError> {
    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);

    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ScenarioError::from))
            .collect(),
        single @ Value::Object(_) => Ok(vec![serde_json::from_value(single)?]),
        other => Err(ScenarioError::InvalidShape(
            teleagent_core::operation::json_type_name(&other).to_string(),
        )),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "id": "S1",
        "conversations": [
            {"role": "user", "content": "Faturamı öğrenmek istiyorum"},
            {"role": "assistant", "content": "{\"thought\":\"id\",\"action\":\"Final Answer\",\"action_input\":\"TC kimlik numaranız nedir?\"}"},
            {"role": "user", "content": "12345678901"},
            {"role": "assistant", "content": "{\"thought\":\"t\",\"action\":\"getBillDetails\",\"action_input\":{\"user_identifier\":\"12345678901\"}}"},
            {"role": "assistant", "content": "{\"thought\":\"t\",\"action\":\"Final Answer\",\"action_input\":\"Son faturanız 250 TL.\"}"}
        ]
    }"#;

    #[test]
    fn test_single_object_file() {
        let scenarios = parse_scenarios(SCENARIO.as_bytes()).unwrap();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].display_id(), "S1");
        assert_eq!(scenarios[0].user_messages().count(), 2);
    }

    #[test]
    fn test_array_with_bom() {
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(format!("[{SCENARIO}, {{\"name\": \"second\"}}]").as_bytes());
        let scenarios = parse_scenarios(&bytes).unwrap();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[1].display_id(), "second");
        assert!(scenarios[1].conversations.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut bytes = br#"{"id": "bad"#.to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(br#"", "conversations": []}"#);
        let scenarios = parse_scenarios(&bytes).unwrap();
        assert_eq!(scenarios[0].display_id(), "bad\u{fffd}");
    }

    #[test]
    fn test_display_id_fallbacks() {
        let scenario: Scenario = serde_json::from_str(r#"{"id": "", "name": null}"#).unwrap();
        assert_eq!(scenario.display_id(), DEFAULT_SCENARIO_ID);
        let scenario: Scenario = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(scenario.display_id(), "7");
    }

    #[test]
    fn test_gold_from_assistant_steps() {
        let scenario = &parse_scenarios(SCENARIO.as_bytes()).unwrap()[0];
        let gold = scenario.gold();
        assert_eq!(gold.tools, vec!["getBillDetails"]);
        assert_eq!(gold.finals.len(), 2);
        assert_eq!(gold.finals[1].input_text(), "Son faturanız 250 TL.");
        assert_eq!(scenario.expected_tools(&gold), vec!["getBillDetails"]);
    }

    #[test]
    fn test_critical_steps_override_gold_tools() {
        let scenario: Scenario = serde_json::from_str(
            r#"{"conversations": [
                {"role": "assistant", "content": "{\"action\":\"getUserInfo\",\"action_input\":{}}"}
            ], "critical_steps": ["getUserInfo", "getBillDetails"]}"#,
        )
        .unwrap();
        let gold = scenario.gold();
        assert_eq!(
            scenario.expected_tools(&gold),
            vec!["getUserInfo", "getBillDetails"]
        );

        let scenario: Scenario =
            serde_json::from_str(r#"{"critical_steps": null}"#).unwrap();
        assert!(scenario.critical_steps.is_empty());
    }

    #[test]
    fn test_rejects_non_object_root() {
        assert!(matches!(
            parse_scenarios(b"42"),
            Err(ScenarioError::InvalidShape(_))
        ));
        assert!(matches!(parse_scenarios(b"{"), Err(ScenarioError::Json(_))));
    }
}
