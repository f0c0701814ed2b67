//! Error types for the progress notification library.

use thiserror::Error;

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Main error type for the progress notification library.
///
/// Progress handles never fail on their own; these errors describe trouble at
/// the binding-transport boundary, or while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The transport could not establish a connection to the worker.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An established connection to the worker went away.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error, kept as text so the enum stays `Clone`.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl NotifyError {
    /// Check if this error describes a broken or missing worker connection.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::ConnectionLost(_))
    }
}

impl From<std::io::Error> for NotifyError {
    fn from(err: std::io::Error) -> Self {
        NotifyError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for NotifyError {
    fn from(err: toml::de::Error) -> Self {
        NotifyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for NotifyError {
    fn from(err: toml::ser::Error) -> Self {
        NotifyError::Serialization(err.to_string())
    }
}
