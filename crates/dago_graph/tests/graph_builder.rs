//! Tests for Graph construction and mutation.
//!
//! These tests verify the mutating API of `Graph`:
//! - Node insertion, lookup and duplicate rejection
//! - Node removal with edge cascade
//! - Edge insertion and endpoint checks
//! - Adjacency queries

use dago_graph::{Edge, EdgeId, ExecutorNode, Graph, Node, NodeType, RouterNode, ValidationError};

fn llm(id: &str) -> ExecutorNode {
    ExecutorNode::new(id, "llm").with_config("model", "gpt-4")
}

fn edge(id: &str, from: &str, to: &str) -> Edge {
    Edge::new(from, to).with_id(EdgeId::from_string(id))
}

fn edge_ids(edges: &[Edge]) -> Vec<&str> {
    edges.iter().map(|e| e.id.as_str()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn add_then_get_returns_same_node() {
    let mut graph = Graph::new("wf");
    let node = Node::from(llm("start").with_name("Start"));
    graph.add_node(node.clone()).unwrap();

    assert_eq!(graph.get_node("start"), Some(&node));
    assert_eq!(graph.node_count(), 1);
    assert!(graph.contains_node("start"));
}

#[test]
fn get_missing_node_is_none() {
    let graph = Graph::new("wf");
    assert!(graph.get_node("missing").is_none());
}

#[test]
fn duplicate_add_leaves_graph_unchanged() {
    let mut graph = Graph::new("wf");
    graph.add_node(llm("a")).unwrap();
    let before = graph.clone();

    let err = graph
        .add_node(ExecutorNode::new("a", "tool"))
        .unwrap_err();
    assert!(matches!(err, ValidationError::DuplicateNode(ref id) if id == "a"));
    assert_eq!(err.field(), "node.id");
    assert_eq!(graph, before);
    assert_eq!(
        graph.get_node("a").and_then(Node::as_executor).map(|n| n.executor_type.as_str()),
        Some("llm")
    );
}

#[test]
fn add_rejects_empty_id() {
    let mut graph = Graph::new("wf");
    let err = graph.add_node(ExecutorNode::new("", "llm")).unwrap_err();
    assert_eq!(err, ValidationError::UnnamedNode);
    assert_eq!(err.field(), "node.id");
    assert!(graph.is_empty());
}

#[test]
fn add_wraps_node_validation_failure() {
    let mut graph = Graph::new("wf");
    let err = graph.add_node(RouterNode::new("r")).unwrap_err();

    assert!(matches!(&err, ValidationError::InvalidNode { node, .. } if node == "r"));
    assert_eq!(err.root(), &ValidationError::NoRoutes);
    assert_eq!(err.field(), "routes");
    assert!(graph.is_empty());
}

#[test]
fn remove_cascades_edges_in_order() {
    let mut graph = Graph::new("wf");
    for id in ["a", "b", "c", "d"] {
        graph.add_node(llm(id)).unwrap();
    }
    graph.add_edge(edge("e1", "a", "b")).unwrap();
    graph.add_edge(edge("e2", "a", "c")).unwrap();
    graph.add_edge(edge("e3", "b", "c")).unwrap();
    graph.add_edge(edge("e4", "c", "d")).unwrap();
    graph.add_edge(edge("e5", "d", "b")).unwrap();

    let removed = graph.remove_node("b");
    assert_eq!(removed.as_ref().map(Node::node_type), Some(NodeType::Executor));
    assert!(!graph.contains_node("b"));
    assert_eq!(edge_ids(graph.edges()), ["e2", "e4"]);
}

#[test]
fn remove_is_idempotent() {
    let mut graph = Graph::new("wf");
    graph.add_node(llm("a")).unwrap();
    graph.add_node(llm("b")).unwrap();
    graph.add_edge(edge("e1", "a", "b")).unwrap();

    assert!(graph.remove_node("a").is_some());
    let after_first = graph.clone();
    assert!(graph.remove_node("a").is_none());
    assert_eq!(graph, after_first);
    assert!(graph.remove_node("never-existed").is_none());
    assert_eq!(graph, after_first);
}

// ─────────────────────────────────────────────────────────────────────────────
// Edges
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn add_edge_appends_in_order() {
    let mut graph = Graph::new("wf");
    graph.add_node(llm("a")).unwrap();
    graph.add_node(llm("b")).unwrap();
    graph.add_edge(edge("e1", "a", "b")).unwrap();
    graph.add_edge(edge("e2", "b", "a").with_condition("state.retry")).unwrap();

    assert_eq!(graph.edge_count(), 2);
    assert_eq!(edge_ids(graph.edges()), ["e1", "e2"]);
    assert!(graph.edges()[1].is_conditional());
}

#[test]
fn add_edge_with_missing_endpoint_changes_nothing() {
    let mut graph = Graph::new("wf");
    graph.add_node(llm("a")).unwrap();

    let err = graph.add_edge(Edge::new("ghost", "a")).unwrap_err();
    assert!(matches!(err, ValidationError::MissingEdgeSource(ref id) if id == "ghost"));
    assert_eq!(err.field(), "edge.from");

    let err = graph.add_edge(Edge::new("a", "ghost")).unwrap_err();
    assert!(matches!(err, ValidationError::MissingEdgeTarget(ref id) if id == "ghost"));
    assert_eq!(err.field(), "edge.to");

    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn add_edge_checks_edge_before_endpoints() {
    let mut graph = Graph::new("wf");
    let err = graph.add_edge(Edge::new("", "x")).unwrap_err();
    assert_eq!(err, ValidationError::EmptyEdgeSource);
    assert_eq!(err.field(), "from");

    let err = graph.add_edge(Edge::new("x", "")).unwrap_err();
    assert_eq!(err.field(), "to");
}

#[test]
fn self_loop_rejected_even_when_node_exists() {
    let mut graph = Graph::new("wf");
    graph.add_node(llm("a")).unwrap();
    let err = graph.add_edge(Edge::new("a", "a")).unwrap_err();
    assert!(matches!(err, ValidationError::SelfLoop(_)));
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn adjacency_queries_preserve_insertion_order() {
    let mut graph = Graph::new("wf");
    for id in ["a", "b", "c"] {
        graph.add_node(llm(id)).unwrap();
    }
    graph.add_edge(edge("e1", "a", "c")).unwrap();
    graph.add_edge(edge("e2", "b", "c")).unwrap();
    graph.add_edge(edge("e3", "a", "b")).unwrap();

    let out: Vec<_> = graph.outgoing_edges("a").map(|e| e.id.as_str()).collect();
    assert_eq!(out, ["e1", "e3"]);
    let inc: Vec<_> = graph.incoming_edges("c").map(|e| e.id.as_str()).collect();
    assert_eq!(inc, ["e1", "e2"]);
    assert_eq!(graph.outgoing_edges("c").count(), 0);
    assert_eq!(graph.incoming_edges("missing").count(), 0);
}

#[test]
fn clone_is_independent() {
    let mut graph = Graph::new("wf");
    graph.add_node(llm("a")).unwrap();
    let mut copy = graph.clone();
    copy.add_node(llm("b")).unwrap();
    copy.metadata_mut().insert("owner".into(), "ops".into());

    assert_eq!(graph.node_count(), 1);
    assert!(graph.metadata().is_empty());
    assert_eq!(copy.node_count(), 2);
}
