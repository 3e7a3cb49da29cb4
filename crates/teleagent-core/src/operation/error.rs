use super::validate::ValidationError;

/// Unexpected failure raised by an operation handler. Business-rule
/// rejections are reported as `success: false` results instead.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("Runtime Error {0}")]
    RuntimeError(#[from] Box<dyn std::error::Error + Sync + Send>),

    #[error("Serde Error {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl OperationError {
    pub fn runtime(message: impl Into<String>) -> Self {
        OperationError::RuntimeError(message.into().into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("operation '{0}' is already registered")]
    Duplicate(String),

    #[error("unknown operation '{0}'")]
    Unknown(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
