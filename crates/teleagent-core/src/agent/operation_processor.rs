use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use log::{info, warn};

use crate::action::ActionObject;
use crate::operation::{OperationRegistry, OperationResult};

/// Runs the operation named by an action and always produces a result.
pub struct OperationProcessor;

impl OperationProcessor {
    /// Resolve, validate and invoke. Rejections and collaborator failures are
    /// converted to `success: false` results; the operation is never called
    /// with arguments that failed validation.
    pub fn execute(registry: &OperationRegistry, action: &ActionObject) -> OperationResult {
        let name = action.action.as_str();

        let args = match registry.validate(name, &action.action_input) {
            Ok(args) => args,
            Err(err) => {
                warn!("Rejected call to '{name}': {err}");
                return OperationResult::failure(err.to_string());
            }
        };

        let operation = match registry.operation(name) {
            Ok(operation) => operation,
            Err(err) => return OperationResult::failure(err.to_string()),
        };

        info!("Invoking operation '{name}'");
        match catch_unwind(AssertUnwindSafe(|| operation.invoke(&args))) {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                warn!("Operation '{name}' failed: {err}");
                OperationResult::failure(err.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Operation '{name}' panicked: {message}");
                OperationResult::failure(format!("operation '{name}' failed: {message}"))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
