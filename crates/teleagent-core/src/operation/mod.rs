//! Backend operations the model may invoke, their declared contracts and the
//! registry that validates calls against them.

use std::fmt;

mod error;
mod registry;
mod result;
mod spec;
mod validate;

pub use error::{OperationError, RegistryError};
pub use registry::OperationRegistry;
pub use result::OperationResult;
pub use spec::{OperationSpec, ParamKind, ParamSpec, json_type_name};
pub use validate::{ValidatedArgs, ValidationError, Violation, bind_input, validate_args};

/// A backend operation reachable from the model.
///
/// Implementations receive arguments that already passed validation against
/// [`Operation::spec`].
pub trait Operation: Send + Sync + fmt::Debug {
    fn spec(&self) -> &OperationSpec;

    fn invoke(&self, args: &ValidatedArgs) -> Result<OperationResult, OperationError>;
}

/// Operation backed by a closure.
pub struct FnOperation<F> {
    spec: OperationSpec,
    handler: F,
}

impl<F> FnOperation<F>
where
    F: Fn(&ValidatedArgs) -> Result<OperationResult, OperationError> + Send + Sync,
{
    pub fn new(spec: OperationSpec, handler: F) -> Self {
        Self { spec, handler }
    }
}

impl<F> fmt::Debug for FnOperation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperation")
            .field("name", &self.spec.name)
            .finish_non_exhaustive()
    }
}

impl<F> Operation for FnOperation<F>
where
    F: Fn(&ValidatedArgs) -> Result<OperationResult, OperationError> + Send + Sync,
{
    fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    fn invoke(&self, args: &ValidatedArgs) -> Result<OperationResult, OperationError> {
        (self.handler)(args)
    }
}

pub fn from_fn<F>(spec: OperationSpec, handler: F) -> FnOperation<F>
where
    F: Fn(&ValidatedArgs) -> Result<OperationResult, OperationError> + Send + Sync,
{
    FnOperation::new(spec, handler)
}
