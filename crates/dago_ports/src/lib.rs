//! Boundary traits for dago.
//!
//! Each module defines one seam between the orchestrator and the outside
//! world. Implementations live elsewhere; this crate only fixes the contracts
//! and the data that crosses them.
//!
//! - [`llm`] - Chat completion clients and structured output
//! - [`tools`] - Tool executors and their registry
//! - [`events`] - Lifecycle events, pub/sub and event storage
//! - [`storage`] - Persistence of state, graph definitions and executions
//! - [`state`] - State management with snapshots and transition history
//! - [`metrics`] - Metrics collection and health checks
//! - [`worker_registry`] - Worker registration and liveness
//! - [`clock`] - Time source used by the in-memory implementations
//!
//! With the `test-utils` feature, the `memory` module provides in-process
//! implementations of the registries, event bus and state storage.

pub mod clock;
pub mod error;
pub mod events;
pub mod llm;
pub mod metrics;
pub mod state;
pub mod storage;
pub mod tools;
pub mod worker_registry;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use clock::{ClockProvider, SystemClock};
pub use error::{PortError, PortResult};
pub use events::{Event, EventBus, EventFilter, EventHandler, EventStore, EventType};
pub use llm::{
    CompletionChunk, CompletionRequest, CompletionResponse, FinishReason, LlmClient,
    LlmClientExt, LlmError, Message, Role, StructuredResponse, ToolCall, ToolDefinition,
    UsageInfo,
};
pub use metrics::{
    HealthCheck, HealthChecker, HealthRegistry, HealthStatus, MetricsCollector, MetricsConfig,
    NoopMetrics,
};
pub use state::{StateManager, StateUpdate, Transition, TransitionLogger};
pub use storage::{ExecutionMetadata, ExecutionStorage, GraphStorage, StateStorage};
pub use tools::{ToolConfig, ToolExecutor, ToolRegistry, ToolResult, ToolSchema, ToolType};
pub use worker_registry::{
    WorkerFilter, WorkerInfo, WorkerRegistry, WorkerStats, WorkerStatus, WorkerType,
};
