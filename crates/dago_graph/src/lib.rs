//! Workflow graph model for dago.
//!
//! `dago_graph` is the structural core of the orchestrator: an in-memory
//! directed graph whose vertices are typed nodes and whose edges carry
//! optional opaque conditions. It checks structure, and it serializes and
//! rebuilds graphs losslessly. Executing a graph is the job of other crates.
//!
//! # Core Concepts
//!
//! - [`Graph`] - Node map plus ordered edge list with a designated entry node
//! - [`Node`] - Closed set of node variants ([`ExecutorNode`], [`RouterNode`])
//! - [`Edge`] - Directed connection with optional condition and label
//! - [`ValidationError`] - First structural problem found, naming its field
//!
//! # Example
//!
//! ```
//! use dago_graph::{Edge, ExecutorNode, Graph, RouterNode};
//!
//! let mut graph = Graph::new("triage");
//! graph.add_node(ExecutorNode::new("classify", "llm").with_config("model", "gpt-4"))?;
//! graph.add_node(RouterNode::new("route").route("state.urgent == true", "page"))?;
//! graph.add_node(ExecutorNode::new("page", "tool"))?;
//! graph.add_edge(Edge::new("classify", "route"))?;
//! graph.add_edge(Edge::new("route", "page").with_label("urgent"))?;
//! graph.set_entry_node("classify");
//! graph.validate()?;
//!
//! let copy = Graph::from_json(&graph.to_json().unwrap()).unwrap();
//! assert_eq!(copy, graph);
//! # Ok::<(), dago_graph::ValidationError>(())
//! ```

mod de;

/// Directed edges between nodes.
pub mod edge;

/// The graph container and its validation.
pub mod graph;

/// Node variants and identifiers.
pub mod node;

pub use edge::{Edge, EdgeId};
pub use graph::{DEFAULT_VERSION, Graph, ValidationError};
pub use node::{ExecutorNode, Node, NodeCommon, NodeId, NodeType, Route, RouterNode, UnknownNodeType};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::edge::{Edge, EdgeId};
    pub use crate::graph::{Graph, ValidationError};
    pub use crate::node::{ExecutorNode, Node, NodeId, NodeType, Route, RouterNode};
}
