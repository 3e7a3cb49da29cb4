use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// The closed set of parameter kinds an operation may declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ParamKind>),
    Object,
}

impl ParamKind {
    pub fn array(item: ParamKind) -> Self {
        ParamKind::Array(Box::new(item))
    }

    /// Strict runtime check of a JSON value against this kind. Numeric strings
    /// are not integers, and integers are numbers but not the other way round.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array(item) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| item.accepts(v))),
        }
    }

    pub fn json_schema(&self) -> Value {
        match self {
            ParamKind::String => json!({"type": "string"}),
            ParamKind::Integer => json!({"type": "integer"}),
            ParamKind::Number => json!({"type": "number"}),
            ParamKind::Boolean => json!({"type": "boolean"}),
            ParamKind::Object => json!({"type": "object"}),
            ParamKind::Array(item) => json!({"type": "array", "items": item.json_schema()}),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::String => f.write_str("string"),
            ParamKind::Integer => f.write_str("integer"),
            ParamKind::Number => f.write_str("number"),
            ParamKind::Boolean => f.write_str("boolean"),
            ParamKind::Object => f.write_str("object"),
            ParamKind::Array(item) => write!(f, "array<{item}>"),
        }
    }
}

/// JSON type name of a value, as reported in validation errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }
}

/// Declared contract of a backend operation.
///
/// Specs are built once from a static table and never change after
/// registration. Both validation and the tool text shown to the model are
/// derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.required)
    }

    /// JSON schema of the argument object.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut schema = param.kind.json_schema();
            if let Value::Object(obj) = &mut schema {
                obj.insert(
                    "description".to_string(),
                    Value::String(param.description.clone()),
                );
            }
            properties.insert(param.name.clone(), schema);
        }

        let required: Vec<Value> = self
            .required_params()
            .map(|p| Value::String(p.name.clone()))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// One-line description in the form `name: description, args: {...}`.
    pub fn render(&self) -> String {
        let schema = self.json_schema();
        let args = schema.get("properties").cloned().unwrap_or(Value::Null);
        let required = schema.get("required").cloned().unwrap_or(Value::Null);
        format!(
            "{}: {}, args: {}, required: {}",
            self.name, self.description, args, required
        )
    }
}
