//! Event publication and storage port.
//!
//! Events describe lifecycle changes of graph executions. The wire format and
//! transport belong to the [`EventBus`] implementation.

use crate::error::PortResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core::fmt;
use core::future::Future;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A graph was accepted for execution.
    #[serde(rename = "graph.submitted")]
    GraphSubmitted,
    /// A graph started executing.
    #[serde(rename = "graph.started")]
    GraphStarted,
    /// A graph finished successfully.
    #[serde(rename = "graph.completed")]
    GraphCompleted,
    /// A graph finished with an error.
    #[serde(rename = "graph.failed")]
    GraphFailed,
    /// A graph was cancelled.
    #[serde(rename = "graph.cancelled")]
    GraphCancelled,
    /// A node started executing.
    #[serde(rename = "node.started")]
    NodeStarted,
    /// A node finished successfully.
    #[serde(rename = "node.completed")]
    NodeCompleted,
    /// A node finished with an error.
    #[serde(rename = "node.failed")]
    NodeFailed,
    /// Execution state changed.
    #[serde(rename = "state.changed")]
    StateChanged,
    /// A tool was executed.
    #[serde(rename = "tool.executed")]
    ToolExecuted,
}

impl EventType {
    /// Returns the dotted event name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EventType::GraphSubmitted => "graph.submitted",
            EventType::GraphStarted => "graph.started",
            EventType::GraphCompleted => "graph.completed",
            EventType::GraphFailed => "graph.failed",
            EventType::GraphCancelled => "graph.cancelled",
            EventType::NodeStarted => "node.started",
            EventType::NodeCompleted => "node.completed",
            EventType::NodeFailed => "node.failed",
            EventType::StateChanged => "state.changed",
            EventType::ToolExecuted => "tool.executed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID.
    pub id: String,
    /// Kind of event.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Execution the event belongs to.
    pub execution_id: String,
    /// Node the event concerns, for node events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Event payload.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
    /// Free-form auxiliary data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Event {
    /// Creates an event with a fresh ID, stamped now.
    #[must_use]
    pub fn new(event_type: EventType, execution_id: impl Into<String>) -> Self {
        Self {
            id: nanoid::nanoid!(),
            event_type,
            timestamp: Utc::now(),
            execution_id: execution_id.into(),
            node_id: None,
            data: Map::new(),
            metadata: Map::new(),
        }
    }

    /// Sets the node the event concerns.
    #[must_use]
    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Adds a payload entry.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Overrides the timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Criteria for selecting events. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Accepted event types; empty accepts all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<EventType>,
    /// Required execution ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    /// Required node ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Earliest accepted timestamp, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    /// Latest accepted timestamp, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
}

impl EventFilter {
    /// Creates a filter that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts events of `event_type` (in addition to already accepted types).
    #[must_use]
    pub fn of_type(mut self, event_type: EventType) -> Self {
        self.types.push(event_type);
        self
    }

    /// Requires the given execution ID.
    #[must_use]
    pub fn for_execution(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    /// Requires the given node ID.
    #[must_use]
    pub fn for_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Requires timestamps within `since..=until`.
    #[must_use]
    pub fn between(mut self, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    /// Returns true if `event` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if !self.types.is_empty() && !self.types.contains(&event.event_type) {
            return false;
        }
        if self
            .execution_id
            .as_ref()
            .is_some_and(|id| *id != event.execution_id)
        {
            return false;
        }
        if self
            .node_id
            .as_ref()
            .is_some_and(|id| event.node_id.as_ref() != Some(id))
        {
            return false;
        }
        if self.since.is_some_and(|since| event.timestamp < since) {
            return false;
        }
        !self.until.is_some_and(|until| event.timestamp > until)
    }
}

/// Receives published events.
///
/// Implemented for async closures taking an owned [`Event`]:
///
/// ```
/// use std::sync::Arc;
/// use dago_ports::{Event, EventHandler, PortResult};
///
/// let handler: Arc<dyn EventHandler> = Arc::new(|event: Event| async move {
///     let _ = event.execution_id;
///     PortResult::Ok(())
/// });
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Handles one event.
    async fn handle(&self, event: &Event) -> PortResult<()>;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PortResult<()>> + Send + 'static,
{
    async fn handle(&self, event: &Event) -> PortResult<()> {
        (self)(event.clone()).await
    }
}

/// Topic-based publish/subscribe.
#[async_trait]
pub trait EventBus: Send + Sync + 'static {
    /// Publishes `event` to every handler subscribed to `topic`.
    async fn publish(&self, topic: &str, event: Event) -> PortResult<()>;

    /// Subscribes `handler` to `topic`.
    async fn subscribe(&self, topic: &str, handler: Arc<dyn EventHandler>) -> PortResult<()>;

    /// Removes every handler subscribed to `topic`.
    async fn unsubscribe(&self, topic: &str) -> PortResult<()>;

    /// Closes the bus; later calls fail.
    async fn close(&self) -> PortResult<()>;
}

/// Durable event log.
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Appends an event.
    async fn store(&self, event: Event) -> PortResult<()>;

    /// Returns the events matching `filter`, oldest first.
    async fn query(&self, filter: &EventFilter) -> PortResult<Vec<Event>>;

    /// Returns the event with `id`.
    ///
    /// # Errors
    ///
    /// [`PortError::NotFound`](crate::PortError::NotFound) if absent.
    async fn get(&self, id: &str) -> PortResult<Event>;

    /// Returns every event of an execution, oldest first.
    async fn by_execution(&self, execution_id: &str) -> PortResult<Vec<Event>>;
}
