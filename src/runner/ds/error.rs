use thiserror::Error;

/// Language level error kinds. All but `InternalError` become thrown error objects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JErrorType {
    #[error("ReferenceError: {0}")]
    ReferenceError(String),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
    #[error("InternalError: {0}")]
    InternalError(String),
}
impl JErrorType {
    pub fn name(&self) -> &'static str {
        match self {
            JErrorType::ReferenceError(_) => "ReferenceError",
            JErrorType::TypeError(_) => "TypeError",
            JErrorType::RangeError(_) => "RangeError",
            JErrorType::SyntaxError(_) => "SyntaxError",
            JErrorType::InternalError(_) => "InternalError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m)
            | JErrorType::InternalError(m) => m,
        }
    }
}

/// Host level faults. These abort the top-level call instead of being catchable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("internal error: {0}")]
    Internal(String),
    #[error("step budget of {0} statements exhausted")]
    StepBudgetExhausted(u64),
}

impl From<JErrorType> for EngineError {
    fn from(e: JErrorType) -> Self {
        match e {
            JErrorType::InternalError(m) => EngineError::Internal(m),
            other => EngineError::Internal(other.to_string()),
        }
    }
}
