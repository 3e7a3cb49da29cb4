//! Handlers behind the telecom operation catalog.

use std::fmt;
use std::sync::Arc;

use teleagent_core::operation::{
    Operation, OperationError, OperationResult, OperationSpec, ValidatedArgs,
};

use crate::store::SubscriberStore;

pub mod account;
pub mod billing;
pub mod lines;
pub mod services;
pub mod support;
pub mod usage;

pub(crate) const CUSTOMER_NOT_FOUND: &str = "Customer not found.";

pub type Handler = fn(&SubscriberStore, &ValidatedArgs) -> Result<OperationResult, OperationError>;

/// A catalog entry bound to the subscriber store it operates on.
pub struct TelecomOperation {
    spec: OperationSpec,
    store: Arc<SubscriberStore>,
    handler: Handler,
}

impl TelecomOperation {
    pub fn new(spec: OperationSpec, store: Arc<SubscriberStore>, handler: Handler) -> Self {
        Self {
            spec,
            store,
            handler,
        }
    }
}

impl fmt::Debug for TelecomOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelecomOperation")
            .field("name", &self.spec.name)
            .finish_non_exhaustive()
    }
}

impl Operation for TelecomOperation {
    fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    fn invoke(&self, args: &ValidatedArgs) -> Result<OperationResult, OperationError> {
        (self.handler)(&self.store, args)
    }
}

pub(crate) fn not_found() -> OperationResult {
    OperationResult::failure(CUSTOMER_NOT_FOUND)
}

#[derive(serde::Deserialize)]
pub(crate) struct UserArgs {
    pub user_identifier: String,
}
