//! Execution records: the lifecycle of a submitted graph and its nodes.
//!
//! Both records follow the same status machine:
//!
//! ```text
//! pending/submitted ──► running ──► completed
//!                          │    ──► failed
//!                          └──────► cancelled
//! ```
//!
//! Once a record reaches a terminal status every further transition is
//! rejected with a [`StateError`].

use crate::error::StateError;
use crate::state::State;
use chrono::{DateTime, Utc};
use core::fmt;
use core::str::FromStr;
use dago_graph::{Graph, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Lifecycle status of a graph or node execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Created, not yet submitted.
    #[default]
    Pending,
    /// Accepted for execution.
    Submitted,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Stopped before finishing.
    Cancelled,
}

impl ExecutionStatus {
    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Submitted => "submitted",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true for `completed`, `failed` and `cancelled`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown execution status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ExecutionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "submitted" => Ok(ExecutionStatus::Submitted),
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            "cancelled" => Ok(ExecutionStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

fn ensure_active(status: ExecutionStatus, key: &str, to: ExecutionStatus) -> Result<(), StateError> {
    if status.is_terminal() {
        return Err(StateError::new(
            key,
            format!("cannot move from terminal status '{status}' to '{to}'"),
        ));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// NodeState
// ─────────────────────────────────────────────────────────────────────────────

/// Execution record of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    /// The node this record belongs to.
    pub node_id: NodeId,
    /// Current status.
    pub status: ExecutionStatus,
    /// Output produced on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the node started running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the node reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Free-form auxiliary data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl NodeState {
    /// Creates a pending record for `node_id`.
    #[must_use]
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            status: ExecutionStatus::Pending,
            output: None,
            error: None,
            started_at: None,
            completed_at: None,
            metadata: Map::new(),
        }
    }

    /// Marks the node as running.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the node already finished.
    pub fn start(&mut self) -> Result<(), StateError> {
        ensure_active(self.status, self.node_id.as_str(), ExecutionStatus::Running)?;
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the node as completed with `output`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the node already finished.
    pub fn complete(&mut self, output: impl Into<Value>) -> Result<(), StateError> {
        ensure_active(self.status, self.node_id.as_str(), ExecutionStatus::Completed)?;
        self.status = ExecutionStatus::Completed;
        self.output = Some(output.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the node as failed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the node already finished.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), StateError> {
        ensure_active(self.status, self.node_id.as_str(), ExecutionStatus::Failed)?;
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Returns how long the node ran, once it has both timestamps.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.completed_at? - self.started_at?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GraphState
// ─────────────────────────────────────────────────────────────────────────────

/// Execution record of a submitted graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    /// ID of the executed graph.
    pub graph_id: String,
    /// Snapshot of the graph at submission time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<Graph>,
    /// Current status.
    pub status: ExecutionStatus,
    /// Inputs supplied at submission.
    #[serde(default)]
    pub inputs: State,
    /// Per-node records, keyed by node ID.
    #[serde(default)]
    pub node_states: BTreeMap<NodeId, NodeState>,
    /// When the graph was submitted.
    pub submitted_at: DateTime<Utc>,
    /// When execution started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When execution reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GraphState {
    /// Creates a submitted record holding a snapshot of `graph`.
    #[must_use]
    pub fn submit(graph: Graph, inputs: State) -> Self {
        Self {
            graph_id: graph.id().to_string(),
            graph: Some(graph),
            status: ExecutionStatus::Submitted,
            inputs,
            node_states: BTreeMap::new(),
            submitted_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Marks the graph as running.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the execution already finished.
    pub fn start(&mut self) -> Result<(), StateError> {
        self.transition(ExecutionStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the graph as completed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the execution already finished.
    pub fn complete(&mut self) -> Result<(), StateError> {
        self.finish(ExecutionStatus::Completed)
    }

    /// Marks the graph as failed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the execution already finished.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), StateError> {
        self.finish(ExecutionStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Marks the graph as cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the execution already finished.
    pub fn cancel(&mut self) -> Result<(), StateError> {
        self.finish(ExecutionStatus::Cancelled)
    }

    /// Returns the record of `node_id`, if one exists.
    #[must_use]
    pub fn node_state(&self, node_id: &str) -> Option<&NodeState> {
        self.node_states.get(node_id)
    }

    /// Returns the record of `node_id`, creating a pending one if needed.
    pub fn node_state_mut(&mut self, node_id: impl Into<NodeId>) -> &mut NodeState {
        let node_id = node_id.into();
        self.node_states
            .entry(node_id.clone())
            .or_insert_with(|| NodeState::new(node_id))
    }

    /// Returns true once the execution reached a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn finish(&mut self, to: ExecutionStatus) -> Result<(), StateError> {
        self.transition(to)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, to: ExecutionStatus) -> Result<(), StateError> {
        ensure_active(self.status, &self.graph_id, to)?;
        self.status = to;
        Ok(())
    }
}
