use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Store(nextcmd_store::Error),
    Normalize(nextcmd_normalize::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Store(err) => write!(f, "store error: {err}"),
            Error::Normalize(err) => write!(f, "normalization error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(err) => Some(err),
            Error::Normalize(err) => Some(err),
        }
    }
}

impl From<nextcmd_store::Error> for Error {
    fn from(err: nextcmd_store::Error) -> Self {
        Error::Store(err)
    }
}

impl From<nextcmd_normalize::Error> for Error {
    fn from(err: nextcmd_normalize::Error) -> Self {
        Error::Normalize(err)
    }
}
