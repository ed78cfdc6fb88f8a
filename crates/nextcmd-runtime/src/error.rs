use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Store(nextcmd_store::Error),
    Engine(nextcmd_engine::Error),
    Core(nextcmd_core::Error),
    Io(std::io::Error),
    Config(String),
    Validation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Store(err) => write!(f, "store error: {err}"),
            Error::Engine(err) => write!(f, "engine error: {err}"),
            Error::Core(err) => write!(f, "core error: {err}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(err) => Some(err),
            Error::Engine(err) => Some(err),
            Error::Core(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Config(_) => None,
            Error::Validation(_) => None,
        }
    }
}

impl From<nextcmd_store::Error> for Error {
    fn from(err: nextcmd_store::Error) -> Self {
        Error::Store(err)
    }
}

impl From<nextcmd_engine::Error> for Error {
    fn from(err: nextcmd_engine::Error) -> Self {
        Error::Engine(err)
    }
}

impl From<nextcmd_core::Error> for Error {
    fn from(err: nextcmd_core::Error) -> Self {
        Error::Core(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
