//! Error type shared by the port traits.

use dago_domain::{BoxError, StateError};

/// Result alias for port operations.
pub type PortResult<T> = Result<T, PortError>;

/// Errors returned by port implementations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The requested item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An item with the same key already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The caller passed an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The port was closed and accepts no more calls.
    #[error("port closed: {0}")]
    Closed(String),

    /// A state update was rejected.
    #[error(transparent)]
    State(#[from] StateError),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store or transport failed.
    #[error("backend error: {message}")]
    Backend {
        /// Error message.
        message: String,
        /// The underlying error source.
        #[source]
        source: Option<BoxError>,
    },
}

impl PortError {
    /// Creates a [`NotFound`](Self::NotFound).
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Creates a [`Backend`](Self::Backend) error with a cause.
    pub fn backend(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}
