use crate::error::{SchemaError, SchemaKind};
use dago_graph::Graph;
use serde_json::Value;

const GRAPH_SCHEMA: &str = include_str!("../schemas/graph.json");
const EXECUTOR_NODE_SCHEMA: &str = include_str!("../schemas/executor_node.json");
const ROUTER_NODE_SCHEMA: &str = include_str!("../schemas/router_node.json");

/// Validates serialized graphs and node fragments against the embedded
/// Draft-7 schemas.
///
/// Compiling is the expensive part; build one validator and share it.
///
/// # Example
///
/// ```
/// use dago_schema::Validator;
///
/// let validator = Validator::new()?;
/// validator.validate_executor_node(br#"{"executor_type": "llm", "config": {}}"#)?;
/// assert!(validator.validate_router_node(br#"{"routes": []}"#).is_err());
/// # Ok::<(), dago_schema::SchemaError>(())
/// ```
pub struct Validator {
    graph: jsonschema::Validator,
    executor_node: jsonschema::Validator,
    router_node: jsonschema::Validator,
}

impl core::fmt::Debug for Validator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

impl Validator {
    /// Compiles the three embedded schemas.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Compile`] if an embedded schema is malformed.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            graph: compile(SchemaKind::Graph, GRAPH_SCHEMA)?,
            executor_node: compile(SchemaKind::ExecutorNode, EXECUTOR_NODE_SCHEMA)?,
            router_node: compile(SchemaKind::RouterNode, ROUTER_NODE_SCHEMA)?,
        })
    }

    /// Validates a serialized graph.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidJson`] or [`SchemaError::Invalid`].
    pub fn validate_graph(&self, json: &[u8]) -> Result<(), SchemaError> {
        self.validate_graph_value(&serde_json::from_slice(json)?)
    }

    /// Validates an executor node configuration fragment.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidJson`] or [`SchemaError::Invalid`].
    pub fn validate_executor_node(&self, json: &[u8]) -> Result<(), SchemaError> {
        let instance: Value = serde_json::from_slice(json)?;
        check(&self.executor_node, SchemaKind::ExecutorNode, &instance)
    }

    /// Validates a router node configuration fragment.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidJson`] or [`SchemaError::Invalid`].
    pub fn validate_router_node(&self, json: &[u8]) -> Result<(), SchemaError> {
        let instance: Value = serde_json::from_slice(json)?;
        check(&self.router_node, SchemaKind::RouterNode, &instance)
    }

    /// Validates an already parsed graph document.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Invalid`].
    pub fn validate_graph_value(&self, graph: &Value) -> Result<(), SchemaError> {
        check(&self.graph, SchemaKind::Graph, graph)
    }

    /// Validates the serialized form of an in-memory graph.
    ///
    /// This complements [`Graph::validate`]: it checks the wire shape, not
    /// referential integrity.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidJson`] if the graph cannot be serialized, or
    /// [`SchemaError::Invalid`].
    pub fn validate_graph_model(&self, graph: &Graph) -> Result<(), SchemaError> {
        self.validate_graph_value(&graph.to_value()?)
    }
}

fn compile(kind: SchemaKind, source: &str) -> Result<jsonschema::Validator, SchemaError> {
    let compile_error = |message: String| SchemaError::Compile { kind, message };
    let schema: Value = serde_json::from_str(source).map_err(|e| compile_error(e.to_string()))?;
    jsonschema::draft7::new(&schema).map_err(|e| compile_error(e.to_string()))
}

fn check(validator: &jsonschema::Validator, kind: SchemaKind, instance: &Value) -> Result<(), SchemaError> {
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| {
            let path = error.instance_path.to_string();
            if path.is_empty() {
                error.to_string()
            } else {
                format!("{path}: {error}")
            }
        })
        .collect();
    if errors.is_empty() {
        return Ok(());
    }
    tracing::debug!(%kind, violations = errors.len(), "schema validation failed");
    Err(SchemaError::Invalid { kind, errors })
}
