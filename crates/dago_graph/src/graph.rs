//! The workflow graph container.
//!
//! A [`Graph`] owns its nodes (keyed by [`NodeId`]) and an ordered sequence
//! of [`Edge`]s. Mutations check only local preconditions; the global
//! invariants are checked on demand by [`Graph::validate`].
//!
//! # Example
//!
//! ```
//! use dago_graph::{Edge, ExecutorNode, Graph};
//!
//! let mut graph = Graph::new("summarize");
//! graph.add_node(ExecutorNode::new("fetch", "tool"))?;
//! graph.add_node(ExecutorNode::new("summarize", "llm"))?;
//! graph.add_edge(Edge::new("fetch", "summarize"))?;
//! graph.set_entry_node("fetch");
//!
//! graph.validate()?;
//! # Ok::<(), dago_graph::ValidationError>(())
//! ```

use crate::de::null_as_default;
use crate::edge::Edge;
use crate::node::{Node, NodeId};
use core::fmt;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Version tag written into newly created graphs.
pub const DEFAULT_VERSION: &str = "1.0";

/// A directed workflow graph.
///
/// Validity is never cached: every call to [`Graph::validate`] re-checks the
/// whole structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(
        default,
        serialize_with = "serialize_sorted",
        deserialize_with = "null_as_default"
    )]
    nodes: HashMap<NodeId, Node>,
    #[serde(default, deserialize_with = "null_as_default")]
    edges: Vec<Edge>,
    #[serde(default)]
    entry_node: NodeId,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    version: String,
}

fn serialize_sorted<S: Serializer>(
    nodes: &HashMap<NodeId, Node>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let sorted: BTreeMap<&NodeId, &Node> = nodes.iter().collect();
    sorted.serialize(serializer)
}

impl Graph {
    /// Creates an empty graph with a generated ID.
    ///
    /// The graph has no entry node and is invalid until at least one node is
    /// added and selected as entry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(nanoid::nanoid!(), name)
    }

    /// Creates an empty graph with a caller-supplied ID.
    #[must_use]
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            nodes: HashMap::new(),
            edges: Vec::new(),
            entry_node: NodeId::default(),
            metadata: Map::new(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    /// Returns the graph ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Returns the entry node ID, if one is set.
    #[must_use]
    pub fn entry_node(&self) -> Option<&NodeId> {
        (!self.entry_node.is_empty()).then_some(&self.entry_node)
    }

    /// Sets the entry node.
    ///
    /// The node is not required to exist yet; [`Graph::validate`] checks it.
    pub fn set_entry_node(&mut self, id: impl Into<NodeId>) {
        self.entry_node = id.into();
    }

    /// Returns the free-form metadata.
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns the metadata mutably.
    pub fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.metadata
    }

    /// Returns the schema version tag.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sets the schema version tag.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Iterates over all nodes in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns the edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Nodes
    // ─────────────────────────────────────────────────────────────────────

    /// Adds a node to the graph.
    ///
    /// All-or-nothing: on error the graph is unchanged.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::UnnamedNode`] if the node has no ID
    /// - [`ValidationError::DuplicateNode`] if the ID is already taken
    /// - [`ValidationError::InvalidNode`] if the node fails its own validation
    pub fn add_node(&mut self, node: impl Into<Node>) -> Result<(), ValidationError> {
        let node = node.into();
        let id = node.id().clone();
        if id.is_empty() {
            return Err(ValidationError::UnnamedNode);
        }
        if self.nodes.contains_key(&id) {
            return Err(ValidationError::DuplicateNode(id));
        }
        node.validate().map_err(|err| ValidationError::InvalidNode {
            node: id.clone(),
            source: Box::new(err),
        })?;
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Looks up a node by ID.
    #[must_use]
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Looks up a node by ID for modification.
    ///
    /// Changing the node's ID through this reference desynchronizes it from
    /// its map key.
    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Returns true if a node with this ID exists.
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Removes a node and every edge touching it.
    ///
    /// Idempotent. The remaining edges keep their relative order. The entry
    /// node is left untouched even if it names the removed node.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let removed = self.nodes.remove(id);
        self.edges.retain(|edge| !edge.touches(id));
        removed
    }

    // ─────────────────────────────────────────────────────────────────────
    // Edges
    // ─────────────────────────────────────────────────────────────────────

    /// Appends an edge after checking it and its endpoints.
    ///
    /// # Errors
    ///
    /// - the edge's own validation error
    /// - [`ValidationError::MissingEdgeSource`] if `from` is not in the graph
    /// - [`ValidationError::MissingEdgeTarget`] if `to` is not in the graph
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), ValidationError> {
        edge.validate()?;
        if !self.nodes.contains_key(&edge.from) {
            return Err(ValidationError::MissingEdgeSource(edge.from));
        }
        if !self.nodes.contains_key(&edge.to) {
            return Err(ValidationError::MissingEdgeTarget(edge.to));
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Iterates over edges leaving `id`, in insertion order.
    pub fn outgoing_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.from == id)
    }

    /// Iterates over edges entering `id`, in insertion order.
    pub fn incoming_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.to == id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────

    /// Checks every structural invariant and returns the first violation.
    ///
    /// Checked in order: graph ID, at least one node, entry node set, entry
    /// node exists, each node, each edge. Cycles and unreachable nodes are
    /// not errors.
    ///
    /// # Errors
    ///
    /// The first failing check. Node failures are wrapped in
    /// [`ValidationError::InvalidNode`], edge failures in
    /// [`ValidationError::InvalidEdge`] with the edge's position.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyGraphId);
        }
        if self.nodes.is_empty() {
            return Err(ValidationError::NoNodes);
        }
        if self.entry_node.is_empty() {
            return Err(ValidationError::NoEntryNode);
        }
        if !self.nodes.contains_key(&self.entry_node) {
            return Err(ValidationError::InvalidEntryNode(self.entry_node.clone()));
        }

        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort_unstable();
        for id in ids {
            self.nodes[id]
                .validate()
                .map_err(|err| ValidationError::InvalidNode {
                    node: id.clone(),
                    source: Box::new(err),
                })?;
        }

        for (index, edge) in self.edges.iter().enumerate() {
            self.validate_edge(edge)
                .map_err(|err| ValidationError::InvalidEdge {
                    index,
                    source: Box::new(err),
                })?;
        }

        Ok(())
    }

    fn validate_edge(&self, edge: &Edge) -> Result<(), ValidationError> {
        edge.validate()?;
        if !self.nodes.contains_key(&edge.from) {
            return Err(ValidationError::MissingEdgeSource(edge.from.clone()));
        }
        if !self.nodes.contains_key(&edge.to) {
            return Err(ValidationError::MissingEdgeTarget(edge.to.clone()));
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Serialization
    // ─────────────────────────────────────────────────────────────────────

    /// Serializes the graph to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serializes the graph to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the graph to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Parses a graph from JSON, rebuilding each node's concrete variant from
    /// its `type` field.
    ///
    /// The result is not validated.
    ///
    /// # Errors
    ///
    /// Malformed JSON or an unknown node `type`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Parses a graph from JSON bytes.
    ///
    /// # Errors
    ///
    /// Malformed JSON or an unknown node `type`.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Structural problems found by [`Graph`] mutations and [`Graph::validate`].
///
/// Every variant names the offending field through [`ValidationError::field`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The graph ID is empty.
    #[error("id: graph ID cannot be empty")]
    EmptyGraphId,
    /// The graph has no nodes.
    #[error("nodes: graph must have at least one node")]
    NoNodes,
    /// No entry node is set.
    #[error("entry_node: graph must have an entry node")]
    NoEntryNode,
    /// The entry node is not in the graph.
    #[error("entry_node: entry node '{0}' does not exist")]
    InvalidEntryNode(NodeId),
    /// A node has an empty ID.
    #[error("id: node ID cannot be empty")]
    EmptyNodeId,
    /// A node without an ID was added to a graph.
    #[error("node.id: node ID cannot be empty")]
    UnnamedNode,
    /// A node with this ID already exists.
    #[error("node.id: node with ID '{0}' already exists")]
    DuplicateNode(NodeId),
    /// An executor node has no executor type.
    #[error("executor_type: executor type cannot be empty")]
    EmptyExecutorType,
    /// A router node has neither routes nor a default route.
    #[error("routes: router must have at least one route or a default route")]
    NoRoutes,
    /// A route has an empty target.
    #[error("routes: route {index} has an empty target")]
    EmptyRouteTarget {
        /// Position of the route.
        index: usize,
    },
    /// An edge has an empty source.
    #[error("from: edge source cannot be empty")]
    EmptyEdgeSource,
    /// An edge has an empty target.
    #[error("to: edge target cannot be empty")]
    EmptyEdgeTarget,
    /// An edge points at its own source.
    #[error("from/to: self-loop on node '{0}' is not allowed")]
    SelfLoop(NodeId),
    /// An edge's source node is not in the graph.
    #[error("edge.from: source node '{0}' does not exist")]
    MissingEdgeSource(NodeId),
    /// An edge's target node is not in the graph.
    #[error("edge.to: target node '{0}' does not exist")]
    MissingEdgeTarget(NodeId),
    /// A node failed its own validation.
    #[error("node '{node}' validation failed: {source}")]
    InvalidNode {
        /// The offending node.
        node: NodeId,
        /// What went wrong.
        source: Box<ValidationError>,
    },
    /// An edge failed validation.
    #[error("edge {index} validation failed: {source}")]
    InvalidEdge {
        /// Position of the edge in the edge sequence.
        index: usize,
        /// What went wrong.
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Returns the name of the offending field.
    ///
    /// Wrapping variants report the field of the error they wrap.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyGraphId | ValidationError::EmptyNodeId => "id",
            ValidationError::NoNodes => "nodes",
            ValidationError::NoEntryNode | ValidationError::InvalidEntryNode(_) => "entry_node",
            ValidationError::UnnamedNode | ValidationError::DuplicateNode(_) => "node.id",
            ValidationError::EmptyExecutorType => "executor_type",
            ValidationError::NoRoutes | ValidationError::EmptyRouteTarget { .. } => "routes",
            ValidationError::EmptyEdgeSource => "from",
            ValidationError::EmptyEdgeTarget => "to",
            ValidationError::SelfLoop(_) => "from/to",
            ValidationError::MissingEdgeSource(_) => "edge.from",
            ValidationError::MissingEdgeTarget(_) => "edge.to",
            ValidationError::InvalidNode { source, .. }
            | ValidationError::InvalidEdge { source, .. } => source.field(),
        }
    }

    /// Returns the innermost error, unwrapping node and edge context.
    #[must_use]
    pub fn root(&self) -> &ValidationError {
        match self {
            ValidationError::InvalidNode { source, .. }
            | ValidationError::InvalidEdge { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Graph({}, {} nodes, {} edges)",
            self.id,
            self.nodes.len(),
            self.edges.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ExecutorNode, RouterNode};

    #[test]
    fn new_graph_has_version_and_generated_id() {
        let graph = Graph::new("wf");
        assert_eq!(graph.version(), DEFAULT_VERSION);
        assert!(!graph.id().is_empty());
        assert_ne!(graph.id(), Graph::new("wf").id());
        assert!(graph.entry_node().is_none());
        assert!(graph.is_empty());
    }

    #[test]
    fn nodes_serialize_in_sorted_order() {
        let mut graph = Graph::with_id("g", "wf");
        for id in ["c", "a", "b"] {
            graph.add_node(ExecutorNode::new(id, "llm")).unwrap();
        }
        let json = graph.to_json().unwrap();
        let a = json.find("\"a\":").unwrap();
        let b = json.find("\"b\":").unwrap();
        let c = json.find("\"c\":").unwrap();
        assert!(a < b && b < c);
        assert_eq!(json, graph.clone().to_json().unwrap());
    }

    #[test]
    fn always_written_fields_are_present() {
        let graph = Graph::with_id("g", "");
        let value = graph.to_value().unwrap();
        assert_eq!(value["nodes"], serde_json::json!({}));
        assert_eq!(value["edges"], serde_json::json!([]));
        assert_eq!(value["entry_node"], "");
        assert_eq!(value["version"], "1.0");
        assert!(value.get("name").is_none());
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn node_validation_runs_in_id_order() {
        let mut graph = Graph::with_id("g", "wf");
        graph.add_node(ExecutorNode::new("a", "llm")).unwrap();
        graph.nodes.insert(NodeId::from("z"), ExecutorNode::new("z", "").into());
        graph.nodes.insert(NodeId::from("m"), RouterNode::new("m").into());
        graph.set_entry_node("a");

        let err = graph.validate().unwrap_err();
        assert!(matches!(
            &err,
            ValidationError::InvalidNode { node, .. } if node == "m"
        ));
        assert_eq!(err.root(), &ValidationError::NoRoutes);
    }

    #[test]
    fn wrapped_errors_report_inner_field() {
        let err = ValidationError::InvalidEdge {
            index: 2,
            source: Box::new(ValidationError::MissingEdgeTarget(NodeId::from("x"))),
        };
        assert_eq!(err.field(), "edge.to");
        assert_eq!(
            err.to_string(),
            "edge 2 validation failed: edge.to: target node 'x' does not exist"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
