//! # dago Internal Library
//!
//! Re-exports the dago crates for convenience.

/// Graph model: nodes, edges and structural validation.
pub use dago_graph;

/// Domain types: errors, execution state and records.
pub use dago_domain;

/// Boundary traits for LLMs, tools, events, storage, metrics and workers.
pub use dago_ports;

/// JSON-schema validation of graph documents.
pub use dago_schema;

/// Configuration, logging and span bookkeeping.
pub use dago_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use dago_core::{Config, LoggerConfig, Tracer};
    pub use dago_domain::{
        DomainError, ExecutionError, ExecutionStatus, GraphState, NodeState, State, StateError,
        ToolError,
    };
    pub use dago_graph::prelude::*;
    pub use dago_ports::{
        Event, EventBus, EventType, LlmClient, LlmClientExt, PortError, PortResult, ToolExecutor,
        ToolRegistry,
    };
    pub use dago_schema::{SchemaError, Validator};
}
