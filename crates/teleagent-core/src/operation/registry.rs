use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::error::RegistryError;
use super::spec::OperationSpec;
use super::validate::{ValidatedArgs, bind_input, validate_args};
use super::Operation;

/// Name-keyed set of operations, iterated in registration order.
#[derive(Default, Clone)]
pub struct OperationRegistry {
    operations: Vec<Arc<dyn Operation>>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.tool_names())
            .finish()
    }
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<O: Operation + 'static>(&mut self, operation: O) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(operation))
    }

    pub fn register_shared(&mut self, operation: Arc<dyn Operation>) -> Result<(), RegistryError> {
        let name = operation.spec().name.clone();
        if self.index.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.index.insert(name, self.operations.len());
        self.operations.push(operation);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&OperationSpec, RegistryError> {
        self.operation(name).map(|op| op.spec())
    }

    pub fn operation(&self, name: &str) -> Result<&Arc<dyn Operation>, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.operations[i])
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))
    }

    /// Validate a raw `action_input` for `name`.
    ///
    /// String inputs are bound to an argument mapping first (see
    /// [`bind_input`]).
    pub fn validate(&self, name: &str, input: &Value) -> Result<ValidatedArgs, RegistryError> {
        let spec = self.resolve(name)?;
        let args = bind_input(spec, input)?;
        Ok(validate_args(spec, &args)?)
    }

    pub fn specs(&self) -> impl Iterator<Item = &OperationSpec> {
        self.operations.iter().map(|op| op.spec())
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.specs().map(|spec| spec.name.clone()).collect()
    }

    /// Tool text shown to the model, one operation per line.
    pub fn describe(&self) -> String {
        self.specs()
            .map(OperationSpec::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{
        OperationError, OperationResult, ParamKind, ParamSpec, ValidationError, from_fn,
    };
    use serde_json::json;

    fn echo(name: &str) -> impl Operation + 'static {
        from_fn(
            OperationSpec::new(name, format!("{name} description")).with_param(
                ParamSpec::required("user_identifier", ParamKind::String, "Customer id"),
            ),
            |args| -> Result<OperationResult, OperationError> {
                Ok(OperationResult::ok().with_data(json!(args.as_map())))
            },
        )
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = OperationRegistry::new();
        registry.register(echo("getUserInfo")).unwrap();
        registry.register(echo("getBillDetails")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("getBillDetails").unwrap().name, "getBillDetails");
        assert_eq!(registry.tool_names(), vec!["getUserInfo", "getBillDetails"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = OperationRegistry::new();
        registry.register(echo("getUserInfo")).unwrap();
        let err = registry.register(echo("getUserInfo")).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "getUserInfo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_operation_fails_closed() {
        let registry = OperationRegistry::new();
        assert!(matches!(
            registry.resolve("dropDatabase"),
            Err(RegistryError::Unknown(_))
        ));
        assert!(matches!(
            registry.validate("dropDatabase", &json!({})),
            Err(RegistryError::Unknown(_))
        ));
    }

    #[test]
    fn test_validate_goes_through_spec() {
        let mut registry = OperationRegistry::new();
        registry.register(echo("getUserInfo")).unwrap();

        let args = registry
            .validate("getUserInfo", &json!({"user_identifier": "C1"}))
            .unwrap();
        assert_eq!(args.str("user_identifier"), Some("C1"));

        let err = registry
            .validate("getUserInfo", &json!({"user_identifier": "C1", "foo": 1}))
            .unwrap_err();
        match err {
            RegistryError::Validation(ValidationError { violations, .. }) => {
                assert_eq!(violations.len(), 1)
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_describe_uses_specs() {
        let mut registry = OperationRegistry::new();
        registry.register(echo("getUserInfo")).unwrap();
        registry.register(echo("getBillDetails")).unwrap();

        let text = registry.describe();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("getUserInfo: getUserInfo description"));
        assert!(lines[1].contains("user_identifier"));
    }
}
