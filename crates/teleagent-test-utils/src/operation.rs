use std::sync::Mutex;

use teleagent_core::operation::{
    Operation, OperationError, OperationResult, OperationSpec, ValidatedArgs,
};

/// Returns a fixed result and remembers every argument set it received.
#[derive(Debug)]
pub struct RecordingOperation {
    spec: OperationSpec,
    result: OperationResult,
    calls: Mutex<Vec<ValidatedArgs>>,
}

impl RecordingOperation {
    pub fn new(spec: OperationSpec) -> Self {
        Self::with_result(spec, OperationResult::ok())
    }

    pub fn with_result(spec: OperationSpec, result: OperationResult) -> Self {
        Self {
            spec,
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ValidatedArgs> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl Operation for RecordingOperation {
    fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    fn invoke(&self, args: &ValidatedArgs) -> Result<OperationResult, OperationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.clone());
        }
        Ok(self.result.clone())
    }
}

#[derive(Debug)]
pub struct FailingOperation {
    spec: OperationSpec,
    message: String,
}

impl FailingOperation {
    pub fn new(spec: OperationSpec, message: impl Into<String>) -> Self {
        Self {
            spec,
            message: message.into(),
        }
    }
}

impl Operation for FailingOperation {
    fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    fn invoke(&self, _args: &ValidatedArgs) -> Result<OperationResult, OperationError> {
        Err(OperationError::runtime(self.message.clone()))
    }
}

#[derive(Debug)]
pub struct PanickingOperation {
    spec: OperationSpec,
}

impl PanickingOperation {
    pub fn new(spec: OperationSpec) -> Self {
        Self { spec }
    }
}

impl Operation for PanickingOperation {
    fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    fn invoke(&self, _args: &ValidatedArgs) -> Result<OperationResult, OperationError> {
        panic!("{} exploded", self.spec.name)
    }
}
