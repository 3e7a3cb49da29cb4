use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::OperationError;
use super::spec::{OperationSpec, json_type_name};

/// A single reason an invocation was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingRequired(Vec<String>),
    UnknownParameters(Vec<String>),
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },
    /// The input could not be read as an argument mapping at all.
    NotAnObject { found: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingRequired(names) => {
                write!(f, "missing required parameters: {}", names.join(", "))
            }
            Violation::UnknownParameters(names) => {
                write!(f, "unknown parameters: {}", names.join(", "))
            }
            Violation::TypeMismatch {
                name,
                expected,
                found,
            } => write!(f, "parameter '{name}' expected {expected}, got {found}"),
            Violation::NotAnObject { found } => {
                write!(f, "action_input must be an object, got {found}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid arguments for '{operation}': {}", render_violations(.violations))]
pub struct ValidationError {
    pub operation: String,
    pub violations: Vec<Violation>,
}

fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn missing_parameters(&self) -> Vec<&str> {
        self.violations
            .iter()
            .filter_map(|v| match v {
                Violation::MissingRequired(names) => Some(names),
                _ => None,
            })
            .flatten()
            .map(String::as_str)
            .collect()
    }

    pub fn unknown_parameters(&self) -> Vec<&str> {
        self.violations
            .iter()
            .filter_map(|v| match v {
                Violation::UnknownParameters(names) => Some(names),
                _ => None,
            })
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

/// Arguments that passed validation against an [`OperationSpec`].
///
/// Optional parameters given as `null` have already been dropped, so a
/// present key always carries a value of the declared kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs(Map<String, Value>);

impl ValidatedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn required_str(&self, name: &str) -> Result<&str, OperationError> {
        self.str(name)
            .ok_or_else(|| OperationError::runtime(format!("argument '{name}' is not available")))
    }

    /// Deserialize the whole argument mapping into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, OperationError> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Check `args` against `spec`, collecting every violation before failing.
pub fn validate_args(
    spec: &OperationSpec,
    args: &Map<String, Value>,
) -> Result<ValidatedArgs, ValidationError> {
    let mut violations = Vec::new();

    let unknown: Vec<String> = args
        .keys()
        .filter(|key| spec.param(key).is_none())
        .cloned()
        .collect();

    let mut missing = Vec::new();
    let mut accepted = Map::new();

    for param in &spec.params {
        match args.get(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    missing.push(param.name.clone());
                }
            }
            Some(value) if param.kind.accepts(value) => {
                accepted.insert(param.name.clone(), value.clone());
            }
            Some(value) => violations.push(Violation::TypeMismatch {
                name: param.name.clone(),
                expected: param.kind.to_string(),
                found: json_type_name(value).to_string(),
            }),
        }
    }

    if !missing.is_empty() {
        violations.insert(0, Violation::MissingRequired(missing));
    }
    if !unknown.is_empty() {
        violations.push(Violation::UnknownParameters(unknown));
    }

    if violations.is_empty() {
        Ok(ValidatedArgs(accepted))
    } else {
        Err(ValidationError {
            operation: spec.name.clone(),
            violations,
        })
    }
}

/// Turn a raw `action_input` into an argument mapping.
///
/// Objects pass through. A string is accepted when it holds a JSON object,
/// when every parameter after the first is optional (the string binds to the
/// first one), or when it is blank and nothing is required. `null` means no
/// arguments.
pub fn bind_input(spec: &OperationSpec, input: &Value) -> Result<Map<String, Value>, ValidationError> {
    let reject = |found: &str| ValidationError {
        operation: spec.name.clone(),
        violations: vec![Violation::NotAnObject {
            found: found.to_string(),
        }],
    };

    match input {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('{')
                && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed)
            {
                return Ok(map);
            }
            if let Some((first, rest)) = spec.params.split_first()
                && rest.iter().all(|p| !p.required)
            {
                let mut map = Map::new();
                map.insert(first.name.clone(), Value::String(text.clone()));
                return Ok(map);
            }
            if trimmed.is_empty() && spec.required_params().next().is_none() {
                return Ok(Map::new());
            }
            Err(reject("string"))
        }
        other => Err(reject(json_type_name(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{ParamKind, ParamSpec};
    use serde_json::json;

    fn bill_spec() -> OperationSpec {
        OperationSpec::new("getBillDetails", "List bills")
            .with_param(ParamSpec::required(
                "user_identifier",
                ParamKind::String,
                "Customer id",
            ))
            .with_param(ParamSpec::optional("months", ParamKind::Integer, "Window"))
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_valid_arguments_pass() {
        let validated =
            validate_args(&bill_spec(), &args(json!({"user_identifier": "C1", "months": 3})))
                .unwrap();
        assert_eq!(validated.str("user_identifier"), Some("C1"));
        assert_eq!(validated.i64("months"), Some(3));
    }

    #[test]
    fn test_missing_required_is_reported() {
        let err = validate_args(&bill_spec(), &args(json!({"months": 3}))).unwrap_err();
        assert_eq!(err.missing_parameters(), vec!["user_identifier"]);
        assert!(err.to_string().contains("user_identifier"));
    }

    #[test]
    fn test_unknown_keys_are_listed() {
        let err = validate_args(
            &bill_spec(),
            &args(json!({"user_identifier": "C1", "foo": 1, "bar": 2})),
        )
        .unwrap_err();
        let mut unknown = err.unknown_parameters();
        unknown.sort();
        assert_eq!(unknown, vec!["bar", "foo"]);
    }

    #[test]
    fn test_every_violation_is_collected() {
        let err = validate_args(&bill_spec(), &args(json!({"months": "3", "foo": true})))
            .unwrap_err();
        assert_eq!(err.violations.len(), 3);
        assert!(matches!(err.violations[0], Violation::MissingRequired(_)));
        assert!(err.violations.iter().any(|v| matches!(
            v,
            Violation::TypeMismatch { name, found, .. } if name == "months" && found == "string"
        )));
    }

    #[test]
    fn test_null_optional_is_not_supplied() {
        let validated = validate_args(
            &bill_spec(),
            &args(json!({"user_identifier": "C1", "months": null})),
        )
        .unwrap();
        assert!(!validated.contains("months"));
    }

    #[test]
    fn test_null_required_is_missing() {
        let err = validate_args(&bill_spec(), &args(json!({"user_identifier": null})))
            .unwrap_err();
        assert_eq!(err.missing_parameters(), vec!["user_identifier"]);
    }

    #[test]
    fn test_bind_json_string_object() {
        let map = bind_input(&bill_spec(), &json!("{\"user_identifier\": \"C1\"}")).unwrap();
        assert_eq!(map.get("user_identifier"), Some(&json!("C1")));
    }

    #[test]
    fn test_bind_single_param_string() {
        let spec = OperationSpec::new("getUserInfo", "Lookup").with_param(ParamSpec::required(
            "user_identifier",
            ParamKind::String,
            "Id",
        ));
        let map = bind_input(&spec, &json!("12345678901")).unwrap();
        assert_eq!(map.get("user_identifier"), Some(&json!("12345678901")));
    }

    #[test]
    fn test_bind_string_to_first_param_when_rest_optional() {
        let map = bind_input(&bill_spec(), &json!("C1")).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("user_identifier"), Some(&json!("C1")));
    }

    #[test]
    fn test_bind_rejects_plain_string_when_later_param_required() {
        let spec = OperationSpec::new("initiatePackageChange", "Change package")
            .with_param(ParamSpec::required("user_identifier", ParamKind::String, "Id"))
            .with_param(ParamSpec::required("new_package_name", ParamKind::String, "Package"));
        let err = bind_input(&spec, &json!("C1")).unwrap_err();
        assert!(matches!(err.violations[0], Violation::NotAnObject { .. }));
    }

    #[test]
    fn test_bind_blank_string_without_required_params() {
        let spec = OperationSpec::new("listTickets", "List").with_param(ParamSpec::optional(
            "status",
            ParamKind::String,
            "Filter",
        ));
        // single parameter: the blank string binds to it
        assert!(bind_input(&spec, &json!("")).is_ok());

        let empty = OperationSpec::new("ping", "No args");
        assert!(bind_input(&empty, &json!("  ")).unwrap().is_empty());
        assert!(bind_input(&empty, &json!("x")).is_err());
    }

    #[test]
    fn test_deserialize_typed_args() {
        #[derive(serde::Deserialize)]
        struct Args {
            user_identifier: String,
            months: Option<i64>,
        }

        let validated =
            validate_args(&bill_spec(), &args(json!({"user_identifier": "C1"}))).unwrap();
        let typed: Args = validated.deserialize().unwrap();
        assert_eq!(typed.user_identifier, "C1");
        assert_eq!(typed.months, None);
    }
}
