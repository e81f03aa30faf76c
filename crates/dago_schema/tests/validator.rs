//! Integration tests for schema validation.
//!
//! Tests cover:
//! - Accepting well-formed graphs, executor and router fragments
//! - Rejecting missing ids, entry nodes, empty node maps and unknown types
//! - Accepting `null` where a collection may be empty
//! - Malformed JSON and error messages
//! - Checking graphs built through the `dago_graph` API

use dago_graph::{Edge, ExecutorNode, Graph, RouterNode};
use dago_schema::{SchemaError, SchemaKind, Validator};

fn validator() -> Validator {
    Validator::new().unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph documents
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn accepts_minimal_graph() {
    let doc = br#"{
        "id": "graph-1",
        "name": "Test Graph",
        "version": "1.0",
        "nodes": {
            "start": {
                "id": "start",
                "type": "executor",
                "executor_type": "llm",
                "config": {"model": "gpt-4"}
            }
        },
        "edges": [],
        "entry_node": "start"
    }"#;
    validator().validate_graph(doc).unwrap();
}

#[test]
fn rejects_missing_id() {
    let doc = br#"{
        "name": "Test Graph",
        "nodes": {"start": {"id": "start", "type": "executor", "executor_type": "llm"}},
        "entry_node": "start"
    }"#;
    let err = validator().validate_graph(doc).unwrap_err();
    assert_eq!(err.kind(), Some(SchemaKind::Graph));
    assert!(err.to_string().starts_with("graph schema validation failed: "));
    assert!(err.to_string().contains("id"));
}

#[test]
fn rejects_missing_entry_node() {
    let doc = br#"{
        "id": "graph-1",
        "nodes": {"start": {"id": "start", "type": "executor", "executor_type": "llm"}}
    }"#;
    assert!(matches!(
        validator().validate_graph(doc),
        Err(SchemaError::Invalid { kind: SchemaKind::Graph, .. })
    ));
}

#[test]
fn rejects_empty_nodes() {
    let doc = br#"{"id": "graph-1", "nodes": {}, "entry_node": "start"}"#;
    assert!(validator().validate_graph(doc).is_err());
}

#[test]
fn rejects_unknown_node_type() {
    let doc = br#"{
        "id": "graph-1",
        "nodes": {"a": {"id": "a", "type": "teleporter"}},
        "entry_node": "a"
    }"#;
    let err = validator().validate_graph(doc).unwrap_err();
    assert_eq!(err.violations().len(), 1);
    assert!(err.violations()[0].starts_with("/nodes/a/type"));
}

#[test]
fn rejects_edge_without_endpoints() {
    let doc = br#"{
        "id": "graph-1",
        "nodes": {"a": {"id": "a", "type": "executor"}},
        "edges": [{"from": "a"}],
        "entry_node": "a"
    }"#;
    assert!(validator().validate_graph(doc).is_err());
}

#[test]
fn malformed_json_is_reported_separately() {
    let err = validator().validate_graph(b"{invalid json}").unwrap_err();
    assert!(matches!(err, SchemaError::InvalidJson(_)));
    assert_eq!(err.kind(), None);
    assert!(err.to_string().starts_with("invalid JSON: "));
}

// ─────────────────────────────────────────────────────────────────────────────
// Node fragments
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn executor_fragment_requires_type_and_config() {
    let v = validator();
    v.validate_executor_node(
        br#"{"executor_type": "llm", "config": {"model": "gpt-4", "temperature": 0.7, "max_tokens": 2000}}"#,
    )
    .unwrap();
    v.validate_executor_node(
        br#"{"executor_type": "tool", "config": {"tool_name": "python", "parameters": {"script": "print('hello')"}, "timeout": 300}}"#,
    )
    .unwrap();

    let missing_type = v
        .validate_executor_node(br#"{"config": {"model": "gpt-4"}}"#)
        .unwrap_err();
    assert_eq!(missing_type.kind(), Some(SchemaKind::ExecutorNode));
    assert!(
        missing_type
            .to_string()
            .starts_with("executor node schema validation failed: ")
    );
    assert!(v.validate_executor_node(br#"{"executor_type": "llm"}"#).is_err());
}

#[test]
fn router_fragment_needs_routes_or_default() {
    let v = validator();
    v.validate_router_node(
        br#"{"routes": [{"condition": "state.score > 0.8", "target": "high", "description": "high scores"}], "default_route": "low"}"#,
    )
    .unwrap();
    v.validate_router_node(br#"{"default_route": "fallback"}"#).unwrap();

    assert!(v.validate_router_node(br#"{}"#).is_err());
    assert!(v.validate_router_node(br#"{"routes": []}"#).is_err());
    let err = v
        .validate_router_node(br#"{"routes": [{"condition": "x"}]}"#)
        .unwrap_err();
    assert_eq!(err.kind(), Some(SchemaKind::RouterNode));
}

#[test]
fn null_collections_are_accepted() {
    let v = validator();
    let doc = br#"{
        "id": "graph-1",
        "nodes": {
            "start": {"id": "start", "type": "executor", "executor_type": "llm", "metadata": null}
        },
        "edges": null,
        "entry_node": "start",
        "metadata": null
    }"#;
    v.validate_graph(doc).unwrap();
    v.validate_executor_node(
        br#"{"executor_type": "llm", "config": null, "input_mapping": null, "output_mapping": null}"#,
    )
    .unwrap();
    v.validate_router_node(br#"{"routes": null, "default_route": "fallback"}"#)
        .unwrap();

    let parsed = Graph::from_slice(doc).unwrap();
    v.validate_graph_model(&parsed).unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory graphs
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn built_graph_passes_schema() {
    let mut graph = Graph::with_id("g1", "triage");
    graph
        .add_node(ExecutorNode::new("classify", "llm").with_config("model", "gpt-4"))
        .unwrap();
    graph
        .add_node(RouterNode::new("route").route("state.urgent == true", "page"))
        .unwrap();
    graph.add_node(ExecutorNode::new("page", "tool")).unwrap();
    graph.add_edge(Edge::new("classify", "route")).unwrap();
    graph.add_edge(Edge::new("route", "page")).unwrap();
    graph.set_entry_node("classify");

    validator().validate_graph_model(&graph).unwrap();
}

#[test]
fn graph_without_entry_fails_schema() {
    let mut graph = Graph::with_id("g1", "triage");
    graph.add_node(ExecutorNode::new("a", "llm")).unwrap();
    let err = validator().validate_graph_model(&graph).unwrap_err();
    assert!(err.violations().iter().any(|v| v.starts_with("/entry_node")));
}
