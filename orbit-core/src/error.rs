use thiserror::Error;

/// Errors that can occur in orbit operations
#[derive(Error, Debug)]
pub enum OrbitError {
    #[error("Event log parse error: {0}")]
    LogParse(String),

    #[error("External snapshot parse error: {0}")]
    ExternalParse(String),

    #[error("Invalid query range: {0}")]
    InvalidRange(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for orbit operations
pub type OrbitResult<T> = Result<T, OrbitError>;
