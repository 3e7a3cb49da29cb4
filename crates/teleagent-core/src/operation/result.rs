use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured outcome of an operation, forwarded to the model as JSON.
///
/// Only `success` is interpreted by the dispatcher; every other field,
/// including anything in `extra`, is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            error: None,
            extra: Map::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::ok()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!("{{\"success\":{}}}", self.success))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_serialization() {
        let result = OperationResult::failure("Customer not found");
        let value: Value = serde_json::from_str(&result.to_json_string()).unwrap();
        assert_eq!(value, json!({"success": false, "error": "Customer not found"}));
    }

    #[test]
    fn test_extra_fields_are_flattened() {
        let result = OperationResult::ok()
            .with_message("done")
            .with_field("ticket_id", json!("T-1"));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["ticket_id"], "T-1");
        assert_eq!(value["message"], "done");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_round_trip_keeps_unknown_fields() {
        let raw = r#"{"success":true,"data":{"a":1},"plan":"monthly"}"#;
        let result: OperationResult = serde_json::from_str(raw).unwrap();
        assert!(result.success);
        assert_eq!(result.extra.get("plan"), Some(&json!("monthly")));
    }
}
