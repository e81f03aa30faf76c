use core::fmt;

/// Which embedded schema an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// A whole serialized graph.
    Graph,
    /// The configuration fragment of an executor node.
    ExecutorNode,
    /// The configuration fragment of a router node.
    RouterNode,
}

impl SchemaKind {
    /// Returns the human-readable name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Graph => "graph",
            SchemaKind::ExecutorNode => "executor node",
            SchemaKind::RouterNode => "router node",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while compiling schemas or validating documents.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The input was not JSON at all.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// An embedded schema failed to compile.
    #[error("{kind} schema failed to compile: {message}")]
    Compile {
        /// Schema that failed.
        kind: SchemaKind,
        /// Compiler message.
        message: String,
    },

    /// The document does not conform to the schema.
    #[error("{kind} schema validation failed: {}", .errors.join("; "))]
    Invalid {
        /// Schema the document was checked against.
        kind: SchemaKind,
        /// One message per violation, prefixed with the instance path.
        errors: Vec<String>,
    },
}

impl SchemaError {
    /// Returns the schema kind, or `None` for malformed input.
    #[must_use]
    pub fn kind(&self) -> Option<SchemaKind> {
        match self {
            SchemaError::InvalidJson(_) => None,
            SchemaError::Compile { kind, .. } | SchemaError::Invalid { kind, .. } => Some(*kind),
        }
    }

    /// Returns the individual violations of an [`SchemaError::Invalid`].
    #[must_use]
    pub fn violations(&self) -> &[String] {
        match self {
            SchemaError::Invalid { errors, .. } => errors,
            _ => &[],
        }
    }
}
