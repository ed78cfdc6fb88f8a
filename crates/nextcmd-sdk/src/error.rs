use std::fmt;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for SDK operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid input rejected before it reached the runtime layer.
    InvalidInput(String),
    /// Error from the underlying runtime layer.
    Runtime(nextcmd_runtime::Error),
    /// The blocking task backing an async call panicked or was cancelled.
    Join(tokio::task::JoinError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::Runtime(err) => write!(f, "{err}"),
            Error::Join(err) => write!(f, "background task failed: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Runtime(err) => Some(err),
            Error::Join(err) => Some(err),
            Error::InvalidInput(_) => None,
        }
    }
}

impl From<nextcmd_runtime::Error> for Error {
    fn from(err: nextcmd_runtime::Error) -> Self {
        Error::Runtime(err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Join(err)
    }
}
