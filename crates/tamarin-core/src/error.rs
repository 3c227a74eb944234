#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    InvalidArgument(String),
    ParseError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            EngineError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

pub type Result<T> = std::result::Result<T, EngineError>;
