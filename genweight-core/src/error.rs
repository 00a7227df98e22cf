use std::fmt;

/// Result type alias for genweight core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for genweight core operations
#[derive(Debug)]
pub enum Error {
    /// The active counter or label was read before any label was set
    /// since the map was created or last reset.
    LabelNotSet,

    /// I/O errors while reading datasets
    Io(std::io::Error),

    /// Configuration errors
    Config(String),

    /// Event source errors (malformed datasets, bad generator parameters)
    Source(String),

    /// A stream worker failed or panicked
    Worker(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LabelNotSet => {
                write!(f, "Logic error: active counter requested before setting the active label")
            }
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
            Error::Source(msg) => write!(f, "Event source error: {msg}"),
            Error::Worker(msg) => write!(f, "Stream worker error: {msg}"),
            Error::Other(msg) => write!(f, "Error: {msg}"),
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

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Source(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
