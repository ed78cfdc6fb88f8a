use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Database(rusqlite::Error),
    Io(std::io::Error),
    /// The on-disk schema version is newer than this binary supports.
    SchemaTooNew { on_disk: i32, supported: i32 },
    /// The data directory is already locked by another process.
    Locked,
    /// The store file failed an integrity check and recovery is disabled.
    Corrupt(String),
    Query(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(err) => write!(f, "database error: {err}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::SchemaTooNew { on_disk, supported } => write!(
                f,
                "on-disk schema version {on_disk} is newer than the {supported} this binary supports"
            ),
            Error::Locked => write!(f, "data directory is locked by another process"),
            Error::Corrupt(msg) => write!(f, "store corrupt: {msg}"),
            Error::Query(msg) => write!(f, "query error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
