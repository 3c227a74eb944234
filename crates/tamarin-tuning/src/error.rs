use std::fmt;

#[derive(Debug)]
pub enum TuningError {
    InvalidArgument(String),
    Format(String),
    Io(std::io::Error),
    TrainingData(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            TuningError::Format(msg) => write!(f, "Format error: {}", msg),
            TuningError::Io(err) => write!(f, "I/O error: {}", err),
            TuningError::TrainingData(err) => write!(f, "Training data error: {}", err),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Io(err) => Some(err),
            TuningError::TrainingData(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TuningError {
    fn from(err: std::io::Error) -> Self {
        TuningError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, TuningError>;
