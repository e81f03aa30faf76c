//! Worker registration and liveness port.
//!
//! Workers announce themselves, send periodic heartbeats and are removed when
//! they stop or go silent. The transport (Redis, Kafka, ...) is up to the
//! implementation.

use crate::error::PortResult;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use core::fmt;
use core::time::Duration;
use dago_graph::NodeType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of node a worker executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerType {
    /// Runs executor nodes.
    Executor,
    /// Runs router nodes.
    Router,
}

impl WorkerType {
    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WorkerType::Executor => "executor",
            WorkerType::Router => "router",
        }
    }

    /// Returns the worker type that runs nodes of `node_type`, if any.
    #[must_use]
    pub const fn for_node(node_type: NodeType) -> Option<WorkerType> {
        match node_type {
            NodeType::Executor => Some(WorkerType::Executor),
            NodeType::Router => Some(WorkerType::Router),
            _ => None,
        }
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current status of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    /// Running but not processing a task.
    Idle,
    /// Processing a task.
    Busy,
    /// Missed heartbeats.
    Unhealthy,
    /// Explicitly stopped.
    Stopped,
}

/// A registered worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerInfo {
    /// Unique worker ID.
    pub id: String,
    /// Kind of node the worker executes.
    #[serde(rename = "type")]
    pub worker_type: WorkerType,
    /// Current status.
    pub status: WorkerStatus,
    /// When the worker first registered.
    pub registered_at: DateTime<Utc>,
    /// When the last heartbeat arrived.
    pub last_heartbeat: DateTime<Utc>,
    /// Task currently being processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    /// Tasks queued on this worker.
    pub pending_tasks: u32,
    /// Worker software version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Free-form auxiliary data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl WorkerInfo {
    /// Creates an idle worker registered now.
    #[must_use]
    pub fn new(id: impl Into<String>, worker_type: WorkerType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            worker_type,
            status: WorkerStatus::Idle,
            registered_at: now,
            last_heartbeat: now,
            current_task: None,
            pending_tasks: 0,
            version: None,
            metadata: Map::new(),
        }
    }

    /// Returns true if the last heartbeat is within `timeout` of `now`.
    #[must_use]
    pub fn is_alive(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        let timeout = TimeDelta::from_std(timeout).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.last_heartbeat) <= timeout
    }
}

/// Criteria for selecting workers. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFilter {
    /// Accepted worker types; empty accepts all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<WorkerType>,
    /// Accepted statuses; empty accepts all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<WorkerStatus>,
    /// Only accept workers with a recent heartbeat.
    #[serde(default)]
    pub healthy_only: bool,
}

impl WorkerFilter {
    /// Creates a filter that accepts every worker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts workers of `worker_type`.
    #[must_use]
    pub fn of_type(mut self, worker_type: WorkerType) -> Self {
        self.types.push(worker_type);
        self
    }

    /// Accepts workers with `status`.
    #[must_use]
    pub fn with_status(mut self, status: WorkerStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// Only accepts workers with a recent heartbeat.
    #[must_use]
    pub fn healthy_only(mut self) -> Self {
        self.healthy_only = true;
        self
    }

    /// Returns true if `worker` satisfies the filter.
    ///
    /// `heartbeat_timeout` decides what "recent" means for `healthy_only`;
    /// an unhealthy or stopped worker is never healthy.
    #[must_use]
    pub fn matches(&self, worker: &WorkerInfo, now: DateTime<Utc>, heartbeat_timeout: Duration) -> bool {
        if !self.types.is_empty() && !self.types.contains(&worker.worker_type) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&worker.status) {
            return false;
        }
        if self.healthy_only {
            let healthy_status = matches!(worker.status, WorkerStatus::Idle | WorkerStatus::Busy);
            return healthy_status && worker.is_alive(now, heartbeat_timeout);
        }
        true
    }
}

/// Aggregate statistics for one worker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Worker type the numbers refer to.
    #[serde(rename = "type")]
    pub worker_type: WorkerType,
    /// Registered workers of this type.
    pub total_workers: usize,
    /// Idle workers.
    pub idle_workers: usize,
    /// Busy workers.
    pub busy_workers: usize,
    /// Unhealthy workers.
    pub unhealthy_workers: usize,
    /// Tasks queued across all workers of this type.
    pub total_pending_tasks: u64,
}

impl WorkerStats {
    /// Computes statistics for `worker_type` over `workers`, ignoring
    /// workers of other types.
    pub fn collect<'a>(
        worker_type: WorkerType,
        workers: impl IntoIterator<Item = &'a WorkerInfo>,
    ) -> Self {
        let mut stats = Self {
            worker_type,
            total_workers: 0,
            idle_workers: 0,
            busy_workers: 0,
            unhealthy_workers: 0,
            total_pending_tasks: 0,
        };
        for worker in workers.into_iter().filter(|w| w.worker_type == worker_type) {
            stats.total_workers += 1;
            stats.total_pending_tasks += u64::from(worker.pending_tasks);
            match worker.status {
                WorkerStatus::Idle => stats.idle_workers += 1,
                WorkerStatus::Busy => stats.busy_workers += 1,
                WorkerStatus::Unhealthy => stats.unhealthy_workers += 1,
                WorkerStatus::Stopped => {}
            }
        }
        stats
    }
}

/// Registry of live workers.
#[async_trait]
pub trait WorkerRegistry: Send + Sync + 'static {
    /// Registers a worker at startup.
    ///
    /// # Errors
    ///
    /// [`PortError::AlreadyExists`](crate::PortError::AlreadyExists) if the ID
    /// is taken.
    async fn register(&self, worker: WorkerInfo) -> PortResult<()>;

    /// Removes a worker at graceful shutdown.
    async fn unregister(&self, worker_id: &str) -> PortResult<()>;

    /// Records a heartbeat with the worker's current status and task.
    async fn heartbeat(
        &self,
        worker_id: &str,
        status: WorkerStatus,
        current_task: Option<&str>,
    ) -> PortResult<()>;

    /// Returns one worker.
    async fn get(&self, worker_id: &str) -> PortResult<WorkerInfo>;

    /// Returns the workers matching `filter`.
    async fn list(&self, filter: &WorkerFilter) -> PortResult<Vec<WorkerInfo>>;

    /// Returns aggregate statistics for `worker_type`.
    async fn stats(&self, worker_type: WorkerType) -> PortResult<WorkerStats>;

    /// Removes workers whose last heartbeat is older than `timeout` and
    /// returns how many were removed.
    async fn cleanup_stale(&self, timeout: Duration) -> PortResult<usize>;
}
