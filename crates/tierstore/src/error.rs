//! Error types for secondary-store operations

use std::fmt;
use std::io;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for secondary-store lookups
#[derive(Debug)]
pub enum Error {
    /// Key not present in the backing store
    NotFound,

    /// I/O error from a file- or network-backed store
    Io(io::Error),

    /// Implementation-defined store failure
    Backend(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "Key not found"),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Backend(msg) => write!(f, "Store failure: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
