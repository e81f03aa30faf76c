//! Error taxonomy shared across dago crates.
//!
//! Structural problems use [`ValidationError`] from the graph crate. Runtime
//! failures carry the node, state key or tool they concern plus an optional
//! underlying cause reachable through [`std::error::Error::source`].

pub use dago_graph::ValidationError;

/// Boxed error used as an underlying cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A node failed while executing.
#[derive(Debug, thiserror::Error)]
#[error("execution error at node '{node_id}': {message}")]
pub struct ExecutionError {
    /// The node that failed.
    pub node_id: String,
    /// What went wrong.
    pub message: String,
    /// The underlying cause.
    #[source]
    pub source: Option<BoxError>,
}

impl ExecutionError {
    /// Creates an error for `node_id`.
    pub fn new(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Reading or writing execution state failed.
#[derive(Debug, thiserror::Error)]
#[error("state error for key '{key}': {message}")]
pub struct StateError {
    /// The state key involved.
    pub key: String,
    /// What went wrong.
    pub message: String,
    /// The underlying cause.
    #[source]
    pub source: Option<BoxError>,
}

impl StateError {
    /// Creates an error for `key`.
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A tool invocation failed.
#[derive(Debug, thiserror::Error)]
#[error("tool error '{tool_name}': {message}")]
pub struct ToolError {
    /// The tool that failed.
    pub tool_name: String,
    /// What went wrong.
    pub message: String,
    /// The underlying cause.
    #[source]
    pub source: Option<BoxError>,
}

impl ToolError {
    /// Creates an error for `tool_name`.
    pub fn new(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Any domain error.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Structural graph problem.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Node execution failure.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// State access failure.
    #[error(transparent)]
    State(#[from] StateError),
    /// Tool failure.
    #[error(transparent)]
    Tool(#[from] ToolError),
}
