//! Edge types for graphs.
//!
//! Edges are directed connections between nodes. A condition on an edge is an
//! opaque expression left to the execution engine; it is never evaluated here.

use crate::de::null_as_default;
use crate::graph::ValidationError;
use crate::node::NodeId;
use core::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Unique identifier for an edge in the graph.
///
/// [`Edge::new`] generates a nanoid, so edges created by independent builders
/// never collide. An edge read from JSON without an `id` keeps an empty one,
/// which is omitted again on output. Internally uses `Arc<str>` for cheap
/// cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(Arc<str>);

impl EdgeId {
    /// Returns the empty ID carried by edges read without one.
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::from(""))
    }

    /// Returns true for the empty ID.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Creates a new edge ID with a unique nanoid.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Creates an edge ID from a specific string value.
    #[must_use]
    pub fn from_string(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The empty ID, as read from an edge without one. Use [`EdgeId::new`] for a
/// fresh identifier.
impl Default for EdgeId {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directed connection `from → to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier for this edge; empty when the document had none.
    #[serde(default = "EdgeId::empty", skip_serializing_if = "EdgeId::is_empty")]
    pub id: EdgeId,
    /// Source node ID.
    #[serde(default)]
    pub from: NodeId,
    /// Destination node ID.
    #[serde(default)]
    pub to: NodeId,
    /// Opaque guard expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Free-form auxiliary data.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub metadata: Map<String, Value>,
}

impl Edge {
    /// Creates an unconditional edge with a fresh ID.
    #[must_use]
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            id: EdgeId::new(),
            from: from.into(),
            to: to.into(),
            condition: None,
            label: None,
            metadata: Map::new(),
        }
    }

    /// Replaces the generated ID.
    #[must_use]
    pub fn with_id(mut self, id: EdgeId) -> Self {
        self.id = id;
        self
    }

    /// Sets the guard expression.
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns true if the edge carries a non-empty condition.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.condition.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Returns true if either endpoint is `node`.
    #[must_use]
    pub fn touches(&self, node: &str) -> bool {
        self.from == node || self.to == node
    }

    /// Checks that both endpoints are set and distinct.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyEdgeSource`], [`ValidationError::EmptyEdgeTarget`]
    /// or [`ValidationError::SelfLoop`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.from.is_empty() {
            return Err(ValidationError::EmptyEdgeSource);
        }
        if self.to.is_empty() {
            return Err(ValidationError::EmptyEdgeTarget);
        }
        if self.from == self.to {
            return Err(ValidationError::SelfLoop(self.from.clone()));
        }
        Ok(())
    }
}
