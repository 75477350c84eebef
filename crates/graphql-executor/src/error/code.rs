use crate::error::ExecutionError;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // Request-level, nothing is executed
    OperationValidationError,
    VariableError,
    // Field-level
    ArgumentError,
    ResolverError,
    // Either, depending on where the construct shows up
    UnsupportedConstruct,
}

impl ErrorCode {
    /// Whether an error with this code aborts the whole request.
    pub fn is_request_error(self) -> bool {
        matches!(self, ErrorCode::OperationValidationError | ErrorCode::VariableError)
    }
}

impl From<&ExecutionError> for ErrorCode {
    fn from(error: &ExecutionError) -> Self {
        match error {
            ExecutionError::Validation(_) => ErrorCode::OperationValidationError,
            ExecutionError::Variable { .. } => ErrorCode::VariableError,
            ExecutionError::Coercion(_) => ErrorCode::ArgumentError,
            ExecutionError::Resolver(_) => ErrorCode::ResolverError,
            ExecutionError::UnsupportedConstruct(_) => ErrorCode::UnsupportedConstruct,
        }
    }
}
