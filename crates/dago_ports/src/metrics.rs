//! Metrics and health-check ports.
//!
//! Collectors are synchronous and infallible: recording a metric must never
//! fail or block the execution path. Exposition (Prometheus or otherwise) is
//! up to the implementation.

use crate::error::PortResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core::fmt;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metric labels as key/value pairs.
pub type Labels<'a> = &'a [(&'a str, &'a str)];

/// Records orchestrator metrics.
pub trait MetricsCollector: Send + Sync + 'static {
    // ─── Counters ───

    /// Counts a submitted graph.
    fn inc_graphs_submitted(&self, labels: Labels<'_>);
    /// Counts a completed graph.
    fn inc_graphs_completed(&self, labels: Labels<'_>);
    /// Counts a failed graph.
    fn inc_graphs_failed(&self, labels: Labels<'_>);
    /// Counts an executed node.
    fn inc_nodes_executed(&self, node_type: &str, labels: Labels<'_>);
    /// Counts a failed node.
    fn inc_nodes_failed(&self, node_type: &str, labels: Labels<'_>);
    /// Counts a tool execution.
    fn inc_tool_executions(&self, tool_name: &str, labels: Labels<'_>);
    /// Counts a tool failure.
    fn inc_tool_failures(&self, tool_name: &str, labels: Labels<'_>);
    /// Counts an LLM call.
    fn inc_llm_calls(&self, model: &str, labels: Labels<'_>);
    /// Adds consumed LLM tokens; `token_type` is e.g. `prompt` or `completion`.
    fn inc_llm_tokens(&self, model: &str, token_type: &str, count: u64, labels: Labels<'_>);

    // ─── Gauges ───

    /// Sets the number of workers for a node type.
    fn set_worker_count(&self, node_type: &str, count: usize);
    /// Sets the depth of a queue.
    fn set_queue_depth(&self, queue: &str, depth: usize);
    /// Sets the number of running executions.
    fn set_active_executions(&self, count: usize);

    // ─── Histograms ───

    /// Observes a graph's total duration.
    fn observe_graph_duration(&self, duration: Duration, labels: Labels<'_>);
    /// Observes a node's duration.
    fn observe_node_duration(&self, node_type: &str, duration: Duration, labels: Labels<'_>);
    /// Observes a tool's duration.
    fn observe_tool_duration(&self, tool_name: &str, duration: Duration, labels: Labels<'_>);
    /// Observes an LLM call's latency.
    fn observe_llm_latency(&self, model: &str, duration: Duration, labels: Labels<'_>);
    /// Observes how long a task waited in a queue.
    fn observe_queue_wait_time(&self, duration: Duration, labels: Labels<'_>);

    // ─── Status-labelled shorthands ───

    /// Counts a graph submission with its outcome.
    fn record_graph_submitted(&self, status: &str);
    /// Counts a finished graph with its outcome and duration.
    fn record_graph_completed(&self, status: &str, duration: Duration);
    /// Counts a finished node with its outcome and duration.
    fn record_node_executed(&self, status: &str, duration: Duration);
    /// Sets the worker pool gauges.
    fn record_worker_pool_status(&self, idle: usize, busy: usize, stopped: usize);
}

/// Collector that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsCollector for NoopMetrics {
    fn inc_graphs_submitted(&self, _: Labels<'_>) {}
    fn inc_graphs_completed(&self, _: Labels<'_>) {}
    fn inc_graphs_failed(&self, _: Labels<'_>) {}
    fn inc_nodes_executed(&self, _: &str, _: Labels<'_>) {}
    fn inc_nodes_failed(&self, _: &str, _: Labels<'_>) {}
    fn inc_tool_executions(&self, _: &str, _: Labels<'_>) {}
    fn inc_tool_failures(&self, _: &str, _: Labels<'_>) {}
    fn inc_llm_calls(&self, _: &str, _: Labels<'_>) {}
    fn inc_llm_tokens(&self, _: &str, _: &str, _: u64, _: Labels<'_>) {}
    fn set_worker_count(&self, _: &str, _: usize) {}
    fn set_queue_depth(&self, _: &str, _: usize) {}
    fn set_active_executions(&self, _: usize) {}
    fn observe_graph_duration(&self, _: Duration, _: Labels<'_>) {}
    fn observe_node_duration(&self, _: &str, _: Duration, _: Labels<'_>) {}
    fn observe_tool_duration(&self, _: &str, _: Duration, _: Labels<'_>) {}
    fn observe_llm_latency(&self, _: &str, _: Duration, _: Labels<'_>) {}
    fn observe_queue_wait_time(&self, _: Duration, _: Labels<'_>) {}
    fn record_graph_submitted(&self, _: &str) {}
    fn record_graph_completed(&self, _: &str, _: Duration) {}
    fn record_node_executed(&self, _: &str, _: Duration) {}
    fn record_worker_pool_status(&self, _: usize, _: usize, _: usize) {}
}

/// Configuration of the metrics endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics are collected.
    pub enabled: bool,
    /// Port of the exposition endpoint.
    pub port: u16,
    /// Path of the exposition endpoint.
    pub path: String,
    /// Metric name prefix.
    pub namespace: String,
    /// Optional second prefix.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subsystem: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
            path: "/metrics".to_string(),
            namespace: "dago".to_string(),
            subsystem: String::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

/// Health of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Working with reduced capacity.
    Degraded,
    /// Not working.
    Unhealthy,
}

impl HealthStatus {
    /// Returns the worst status of `statuses`, or `Healthy` if empty.
    pub fn worst(statuses: impl IntoIterator<Item = HealthStatus>) -> HealthStatus {
        statuses.into_iter().max().unwrap_or(HealthStatus::Healthy)
    }

    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Name of the checked component.
    pub name: String,
    /// Observed health.
    pub status: HealthStatus,
    /// Human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the check ran.
    pub last_checked: DateTime<Utc>,
}

impl HealthCheck {
    /// Creates a check result stamped now.
    #[must_use]
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            message: None,
            last_checked: Utc::now(),
        }
    }

    /// Sets the detail message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Checks the health of one component.
#[async_trait]
pub trait HealthChecker: Send + Sync + 'static {
    /// Runs the check.
    async fn check(&self) -> HealthCheck;

    /// Name of the checked component.
    fn name(&self) -> &str;
}

/// Collection of health checkers.
#[async_trait]
pub trait HealthRegistry: Send + Sync + 'static {
    /// Adds a checker.
    ///
    /// # Errors
    ///
    /// [`PortError::AlreadyExists`](crate::PortError::AlreadyExists) if a
    /// checker with the same name is registered.
    fn register(&self, checker: Arc<dyn HealthChecker>) -> PortResult<()>;

    /// Removes the checker named `name`.
    fn unregister(&self, name: &str) -> PortResult<()>;

    /// Runs every checker.
    async fn check_all(&self) -> Vec<HealthCheck>;

    /// Runs the checker named `name`.
    async fn check(&self, name: &str) -> PortResult<HealthCheck>;
}
