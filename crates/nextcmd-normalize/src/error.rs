use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The raw command was empty or contained only whitespace after
    /// alias expansion.
    EmptyCommand,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyCommand => write!(f, "empty command"),
        }
    }
}

impl std::error::Error for Error {}
