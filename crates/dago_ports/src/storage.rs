//! Persistence ports for execution state, graph definitions and execution
//! metadata.

use crate::error::PortResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core::time::Duration;
use dago_domain::{ExecutionStatus, State};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persists the [`State`] of executions.
#[async_trait]
pub trait StateStorage: Send + Sync + 'static {
    /// Stores `state` for `execution_id`, replacing any previous value.
    async fn save(&self, execution_id: &str, state: &State) -> PortResult<()>;

    /// Loads the state of `execution_id`.
    ///
    /// # Errors
    ///
    /// [`PortError::NotFound`](crate::PortError::NotFound) if absent or expired.
    async fn load(&self, execution_id: &str) -> PortResult<State>;

    /// Deletes the state of `execution_id`. Deleting a missing entry succeeds.
    async fn delete(&self, execution_id: &str) -> PortResult<()>;

    /// Returns true if state exists for `execution_id`.
    async fn exists(&self, execution_id: &str) -> PortResult<bool>;

    /// Expires the state of `execution_id` after `ttl`.
    ///
    /// # Errors
    ///
    /// [`PortError::NotFound`](crate::PortError::NotFound) if absent.
    async fn set_ttl(&self, execution_id: &str, ttl: Duration) -> PortResult<()>;

    /// Returns every execution ID with stored state.
    async fn list(&self) -> PortResult<Vec<String>>;
}

/// Persists serialized graph definitions.
#[async_trait]
pub trait GraphStorage: Send + Sync + 'static {
    /// Stores the serialized graph under `graph_id`.
    async fn save(&self, graph_id: &str, data: &[u8]) -> PortResult<()>;

    /// Loads the serialized graph stored under `graph_id`.
    async fn load(&self, graph_id: &str) -> PortResult<Vec<u8>>;

    /// Deletes the graph stored under `graph_id`.
    async fn delete(&self, graph_id: &str) -> PortResult<()>;

    /// Returns true if a graph is stored under `graph_id`.
    async fn exists(&self, graph_id: &str) -> PortResult<bool>;

    /// Returns every stored graph ID.
    async fn list(&self) -> PortResult<Vec<String>>;

    /// Returns the stored versions of the graph named `graph_name`.
    async fn list_versions(&self, graph_name: &str) -> PortResult<Vec<String>>;
}

/// Summary of one graph execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Unique execution ID.
    pub execution_id: String,
    /// ID of the executed graph.
    pub graph_id: String,
    /// Current status.
    pub status: ExecutionStatus,
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// When execution finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Node currently executing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_node_id: Option<String>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Free-form auxiliary data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ExecutionMetadata {
    /// Creates pending metadata for a new execution, started now.
    #[must_use]
    pub fn new(execution_id: impl Into<String>, graph_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            graph_id: graph_id.into(),
            status: ExecutionStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            current_node_id: None,
            error: None,
            metadata: Map::new(),
        }
    }
}

/// Persists [`ExecutionMetadata`].
#[async_trait]
pub trait ExecutionStorage: Send + Sync + 'static {
    /// Stores `metadata`, replacing any entry with the same execution ID.
    async fn save(&self, metadata: &ExecutionMetadata) -> PortResult<()>;

    /// Loads the metadata of `execution_id`.
    async fn load(&self, execution_id: &str) -> PortResult<ExecutionMetadata>;

    /// Changes the status of `execution_id`.
    async fn update_status(&self, execution_id: &str, status: ExecutionStatus) -> PortResult<()>;

    /// Returns every execution, or only those with `status`.
    async fn list(&self, status: Option<ExecutionStatus>) -> PortResult<Vec<ExecutionMetadata>>;

    /// Deletes the metadata of `execution_id`.
    async fn delete(&self, execution_id: &str) -> PortResult<()>;
}
