//! Node types for workflow graphs.
//!
//! Nodes are the vertices of a workflow graph. Each node is one of a closed set
//! of tagged variants; the `type` field of the serialized form is the
//! discriminant used to rebuild the concrete variant.
//!
//! Nodes are pure data. How a node runs is decided by an execution engine
//! keyed off [`Node::node_type`], not by the node itself.

use core::borrow::Borrow;
use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::de::null_as_default;
use crate::graph::ValidationError;

/// Unique identifier for a node in the graph.
///
/// Node IDs are caller-supplied strings. Internally uses `Arc<str>` so that
/// edges and routes can reference nodes without copying the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Creates a node ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the ID is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self(Arc::from(""))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(Arc::from(id))
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<&String> for NodeId {
    fn from(id: &String) -> Self {
        Self(Arc::from(id.as_str()))
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// Category tag of a node.
///
/// Only [`NodeType::Executor`] and [`NodeType::Router`] have a structural
/// shape in this crate. The remaining tags are reserved for execution engines
/// and cannot be deserialized into a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Executes a task (LLM call, tool invocation, script).
    Executor,
    /// Picks the next node based on execution state.
    Router,
    /// Entry point of a graph.
    Start,
    /// Exit point of a graph.
    End,
    /// Autonomous agent loop.
    Agent,
    /// Fan-out to concurrent branches.
    Parallel,
    /// Binary branch.
    Conditional,
    /// Repeated sub-flow.
    Loop,
    /// Applies a sub-flow to each element of a collection.
    Map,
    /// Folds the results of a map.
    Reduce,
}

impl NodeType {
    /// All known node type tags.
    pub const ALL: [NodeType; 10] = [
        NodeType::Executor,
        NodeType::Router,
        NodeType::Start,
        NodeType::End,
        NodeType::Agent,
        NodeType::Parallel,
        NodeType::Conditional,
        NodeType::Loop,
        NodeType::Map,
        NodeType::Reduce,
    ];

    /// Returns the serialized tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeType::Executor => "executor",
            NodeType::Router => "router",
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::Agent => "agent",
            NodeType::Parallel => "parallel",
            NodeType::Conditional => "conditional",
            NodeType::Loop => "loop",
            NodeType::Map => "map",
            NodeType::Reduce => "reduce",
        }
    }

    /// Returns true if this tag has a dedicated [`Node`] variant.
    #[must_use]
    pub const fn has_shape(self) -> bool {
        matches!(self, NodeType::Executor | NodeType::Router)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown node type tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node type: {0}")]
pub struct UnknownNodeType(pub String);

impl FromStr for NodeType {
    type Err = UnknownNodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownNodeType(s.to_string()))
    }
}

/// Fields shared by every node variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeCommon {
    /// Unique identifier of the node within its graph.
    #[serde(default)]
    pub id: NodeId,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// What the node does.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Free-form auxiliary data.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub metadata: Map<String, Value>,
}

impl NodeCommon {
    /// Creates common fields with the given ID.
    #[must_use]
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A node in the workflow graph.
///
/// Serialized as a flat JSON object whose `type` field selects the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Runs an executor (LLM, tool, script).
    Executor(ExecutorNode),
    /// Chooses the next node from a list of conditional routes.
    Router(RouterNode),
}

impl Node {
    /// Returns the node's ID.
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.common().id
    }

    /// Returns the node's type tag.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Executor(_) => NodeType::Executor,
            Node::Router(_) => NodeType::Router,
        }
    }

    /// Returns the node's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.common().name
    }

    /// Returns the node's description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.common().description
    }

    /// Returns the node's metadata.
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.common().metadata
    }

    /// Returns the fields shared by all variants.
    #[must_use]
    pub fn common(&self) -> &NodeCommon {
        match self {
            Node::Executor(n) => &n.common,
            Node::Router(n) => &n.common,
        }
    }

    /// Returns the shared fields mutably.
    pub fn common_mut(&mut self) -> &mut NodeCommon {
        match self {
            Node::Executor(n) => &mut n.common,
            Node::Router(n) => &mut n.common,
        }
    }

    /// Returns the executor variant, if this is one.
    #[must_use]
    pub fn as_executor(&self) -> Option<&ExecutorNode> {
        match self {
            Node::Executor(n) => Some(n),
            Node::Router(_) => None,
        }
    }

    /// Returns the router variant, if this is one.
    #[must_use]
    pub fn as_router(&self) -> Option<&RouterNode> {
        match self {
            Node::Router(n) => Some(n),
            Node::Executor(_) => None,
        }
    }

    /// Checks the node's own structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant of the concrete variant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Node::Executor(n) => n.validate(),
            Node::Router(n) => n.validate(),
        }
    }
}

impl From<ExecutorNode> for Node {
    fn from(node: ExecutorNode) -> Self {
        Node::Executor(node)
    }
}

impl From<RouterNode> for Node {
    fn from(node: RouterNode) -> Self {
        Node::Router(node)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExecutorNode
// ─────────────────────────────────────────────────────────────────────────────

/// A node that executes a task such as an LLM call or a tool invocation.
///
/// `config` is interpreted by the executor selected by `executor_type`.
/// The mappings rename workflow state fields to executor parameters
/// (`input_mapping`) and executor outputs back to state fields
/// (`output_mapping`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorNode {
    /// Shared node fields.
    #[serde(flatten)]
    pub common: NodeCommon,
    /// Executor kind, e.g. `"llm"`, `"tool"`, `"python"`.
    #[serde(default)]
    pub executor_type: String,
    /// Executor-specific configuration.
    #[serde(default, deserialize_with = "null_as_default")]
    pub config: Map<String, Value>,
    /// State field → executor parameter.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub input_mapping: BTreeMap<String, String>,
    /// Executor output → state field.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub output_mapping: BTreeMap<String, String>,
}

impl ExecutorNode {
    /// Creates an executor node with an empty configuration.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, executor_type: impl Into<String>) -> Self {
        Self {
            common: NodeCommon::new(id),
            executor_type: executor_type.into(),
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.common.name = name.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.common.description = description.into();
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.common.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds a configuration entry.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Maps a state field onto an executor parameter.
    #[must_use]
    pub fn map_input(mut self, state_field: impl Into<String>, param: impl Into<String>) -> Self {
        self.input_mapping.insert(state_field.into(), param.into());
        self
    }

    /// Maps an executor output onto a state field.
    #[must_use]
    pub fn map_output(mut self, output: impl Into<String>, state_field: impl Into<String>) -> Self {
        self.output_mapping.insert(output.into(), state_field.into());
        self
    }

    /// Checks that the ID and executor type are set.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyNodeId`] or [`ValidationError::EmptyExecutorType`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.common.id.is_empty() {
            return Err(ValidationError::EmptyNodeId);
        }
        if self.executor_type.is_empty() {
            return Err(ValidationError::EmptyExecutorType);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RouterNode
// ─────────────────────────────────────────────────────────────────────────────

/// A conditional routing rule of a [`RouterNode`].
///
/// The condition is an opaque expression for an external evaluator; it is
/// never parsed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Expression evaluated against the execution state.
    #[serde(default)]
    pub condition: String,
    /// Node to route to when the condition holds.
    #[serde(default)]
    pub target: NodeId,
    /// Human-readable context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Route {
    /// Creates a route to `target` guarded by `condition`.
    #[must_use]
    pub fn new(condition: impl Into<String>, target: impl Into<NodeId>) -> Self {
        Self {
            condition: condition.into(),
            target: target.into(),
            description: String::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A node that picks the next node based on execution state.
///
/// Routes are tried in order by the execution engine; `default_route` is the
/// fallback when none matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterNode {
    /// Shared node fields.
    #[serde(flatten)]
    pub common: NodeCommon,
    /// Ordered routing rules.
    #[serde(default, deserialize_with = "null_as_default")]
    pub routes: Vec<Route>,
    /// Fallback target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_route: Option<NodeId>,
}

impl RouterNode {
    /// Creates a router node with no routes.
    #[must_use]
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            common: NodeCommon::new(id),
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.common.name = name.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.common.description = description.into();
        self
    }

    /// Appends a route.
    #[must_use]
    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Appends a route built from a condition and a target.
    #[must_use]
    pub fn route(self, condition: impl Into<String>, target: impl Into<NodeId>) -> Self {
        self.with_route(Route::new(condition, target))
    }

    /// Sets the fallback target.
    #[must_use]
    pub fn with_default_route(mut self, target: impl Into<NodeId>) -> Self {
        self.default_route = Some(target.into());
        self
    }

    /// Returns true if a non-empty default route is set.
    #[must_use]
    pub fn has_default_route(&self) -> bool {
        self.default_route.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Checks the ID, that at least one route or a default exists, and that
    /// every route has a target.
    ///
    /// # Errors
    ///
    /// The first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.common.id.is_empty() {
            return Err(ValidationError::EmptyNodeId);
        }
        if self.routes.is_empty() && !self.has_default_route() {
            return Err(ValidationError::NoRoutes);
        }
        if let Some(index) = self.routes.iter().position(|r| r.target.is_empty()) {
            return Err(ValidationError::EmptyRouteTarget { index });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executor_requires_id_and_type() {
        assert!(ExecutorNode::new("n", "llm").validate().is_ok());
        assert_eq!(
            ExecutorNode::new("", "llm").validate(),
            Err(ValidationError::EmptyNodeId)
        );
        assert_eq!(
            ExecutorNode::new("n", "").validate(),
            Err(ValidationError::EmptyExecutorType)
        );
    }

    #[test]
    fn router_without_routes_needs_default() {
        let router = RouterNode::new("r");
        assert_eq!(router.validate(), Err(ValidationError::NoRoutes));

        let router = RouterNode::new("r").with_default_route("");
        assert_eq!(router.validate(), Err(ValidationError::NoRoutes));

        let router = RouterNode::new("r").with_default_route("x");
        assert!(router.validate().is_ok());
    }

    #[test]
    fn router_reports_index_of_empty_target() {
        let router = RouterNode::new("r")
            .route("state.score > 0.8", "high")
            .route("state.score <= 0.8", "");
        assert_eq!(
            router.validate(),
            Err(ValidationError::EmptyRouteTarget { index: 1 })
        );
    }

    #[test]
    fn router_condition_is_not_parsed() {
        let router = RouterNode::new("r").route("this is {{ not valid", "next");
        assert!(router.validate().is_ok());
    }

    #[test]
    fn node_type_round_trips_through_str() {
        for ty in NodeType::ALL {
            assert_eq!(ty.as_str().parse::<NodeType>(), Ok(ty));
        }
        assert!("subgraph".parse::<NodeType>().is_err());
        assert!(NodeType::Executor.has_shape());
        assert!(!NodeType::Start.has_shape());
    }

    #[test]
    fn node_serializes_flat_with_type_tag() {
        let node = Node::from(
            ExecutorNode::new("start", "llm")
                .with_name("Start")
                .with_config("model", "gpt-4")
                .map_input("question", "prompt"),
        );
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "executor");
        assert_eq!(value["id"], "start");
        assert_eq!(value["name"], "Start");
        assert_eq!(value["executor_type"], "llm");
        assert_eq!(value["config"]["model"], "gpt-4");
        assert_eq!(value["input_mapping"]["question"], "prompt");
        assert!(value.get("description").is_none());
        assert!(value.get("output_mapping").is_none());
    }

    #[test]
    fn router_deserializes_into_router_variant() {
        let json = r#"{
            "id": "route",
            "type": "router",
            "routes": [{"condition": "x > 1", "target": "big", "description": "large"}],
            "default_route": "small"
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let router = node.as_router().expect("router variant");
        assert_eq!(router.routes.len(), 1);
        assert_eq!(router.routes[0].target, "big");
        assert_eq!(router.routes[0].description, "large");
        assert_eq!(router.default_route.as_ref().map(NodeId::as_str), Some("small"));
        assert_eq!(node.node_type(), NodeType::Router);
    }

    #[test]
    fn shapeless_tag_is_rejected() {
        let json = r#"{"id": "s", "type": "start"}"#;
        assert!(serde_json::from_str::<Node>(json).is_err());
    }

    #[test]
    fn node_id_borrows_as_str() {
        let mut map = hashbrown::HashMap::new();
        map.insert(NodeId::from("a"), 1);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(NodeId::from("a"), "a");
    }
}
