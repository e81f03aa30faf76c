//! Lightweight span bookkeeping for cross-service traces.
//!
//! A [`Span`] records a unit of work with its timing, tags and events. Spans
//! started from a parent [`SpanContext`] share its trace ID, so the context
//! can travel with a task to another process and be continued there.
//! Finished spans are reported as `tracing` events; exporting them to a
//! tracing backend is left to the subscriber.

use chrono::{DateTime, TimeDelta, Utc};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of a span within a trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanContext {
    /// Shared by every span of the trace.
    pub trace_id: String,
    /// Unique to this span.
    pub span_id: String,
    /// The span this one was started from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
}

impl SpanContext {
    /// Returns true if the span has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}

/// Outcome of a span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    /// Not decided yet.
    #[default]
    Unset,
    /// Completed successfully.
    Ok,
    /// Completed with an error.
    Error,
}

impl SpanStatus {
    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SpanStatus::Unset => "unset",
            SpanStatus::Ok => "ok",
            SpanStatus::Error => "error",
        }
    }
}

impl fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time occurrence inside a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEvent {
    /// Event name.
    pub name: String,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Key/value details.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// A unit of work in a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    context: SpanContext,
    name: String,
    start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<DateTime<Utc>>,
    tags: BTreeMap<String, String>,
    events: Vec<SpanEvent>,
    status: SpanStatus,
}

impl Span {
    /// Returns the span's identity.
    #[must_use]
    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the start time.
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns the end time, once ended.
    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Returns the tag `key`.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[SpanEvent] {
        &self.events
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> SpanStatus {
        self.status
    }

    /// Returns true once [`Tracer::end_span`] has been called.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    /// Sets a tag, replacing any previous value.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Records an event stamped now.
    pub fn add_event<K, V>(&mut self, name: impl Into<String>, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.events.push(SpanEvent {
            name: name.into(),
            timestamp: Utc::now(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        });
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: SpanStatus) {
        self.status = status;
    }

    /// Marks the span failed and records the error message.
    pub fn set_error(&mut self, error: &dyn core::error::Error) {
        self.status = SpanStatus::Error;
        self.set_tag("error", "true");
        self.set_tag("error.message", error.to_string());
    }

    /// Returns the elapsed time, up to now if the span is still open.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end_time.unwrap_or_else(Utc::now) - self.start_time
    }
}

/// Creates and finishes spans on behalf of one service.
///
/// # Example
///
/// ```
/// use dago_core::trace::{SpanStatus, Tracer};
///
/// let tracer = Tracer::new("router");
/// let mut root = tracer.start_span("execute_graph", None);
/// let mut child = tracer.start_span("execute_node", Some(root.context()));
/// assert_eq!(child.context().trace_id, root.context().trace_id);
///
/// child.set_tag("node_id", "classify");
/// tracer.end_span(&mut child);
/// tracer.end_span(&mut root);
/// assert_eq!(root.status(), SpanStatus::Ok);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracer {
    service_name: String,
}

impl Tracer {
    /// Creates a tracer for `service_name`.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Returns the service name stamped on every span.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Starts a span. A child of `parent` joins its trace; otherwise a new
    /// trace begins.
    #[must_use]
    pub fn start_span(&self, name: impl Into<String>, parent: Option<&SpanContext>) -> Span {
        let span_id = nanoid::nanoid!();
        let context = match parent {
            Some(parent) => SpanContext {
                trace_id: parent.trace_id.clone(),
                span_id,
                parent_span_id: Some(parent.span_id.clone()),
            },
            None => SpanContext {
                trace_id: nanoid::nanoid!(),
                span_id,
                parent_span_id: None,
            },
        };

        let mut tags = BTreeMap::new();
        tags.insert("service.name".to_string(), self.service_name.clone());

        Span {
            context,
            name: name.into(),
            start_time: Utc::now(),
            end_time: None,
            tags,
            events: Vec::new(),
            status: SpanStatus::Unset,
        }
    }

    /// Finishes a span. An unset status becomes [`SpanStatus::Ok`].
    ///
    /// Ending a span twice keeps the first end time.
    pub fn end_span(&self, span: &mut Span) {
        if span.end_time.is_some() {
            return;
        }
        span.end_time = Some(Utc::now());
        if span.status == SpanStatus::Unset {
            span.status = SpanStatus::Ok;
        }
        tracing::debug!(
            service = %self.service_name,
            trace_id = %span.context.trace_id,
            span_id = %span.context.span_id,
            name = %span.name,
            status = %span.status,
            duration_ms = span.duration().num_milliseconds(),
            "span finished"
        );
    }
}
