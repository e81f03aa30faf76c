use crate::error::{PortError, PortResult};
use crate::events::{Event, EventBus, EventFilter, EventHandler, EventStore};
use async_trait::async_trait;
use core::sync::atomic::{AtomicBool, Ordering};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// [`EventBus`] that delivers events to handlers in-process.
///
/// Handlers of a topic run one after another, in subscription order, before
/// [`EventBus::publish`] returns. A failing handler is logged and does not
/// stop delivery to the others.
#[derive(Default)]
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    closed: AtomicBool,
}

impl core::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut topics: Vec<String> = self.handlers.read().keys().cloned().collect();
        topics.sort_unstable();
        f.debug_struct("InMemoryEventBus")
            .field("topics", &topics)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl InMemoryEventBus {
    /// Creates an open bus without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> PortResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PortError::Closed("event bus".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, event: Event) -> PortResult<()> {
        self.ensure_open()?;
        let handlers = self.handlers.read().get(topic).cloned().unwrap_or_default();
        tracing::trace!(
            topic,
            event_type = %event.event_type,
            handlers = handlers.len(),
            "publishing event"
        );
        for handler in handlers {
            if let Err(err) = handler.handle(&event).await {
                tracing::warn!(topic, event_id = %event.id, error = %err, "event handler failed");
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: Arc<dyn EventHandler>) -> PortResult<()> {
        self.ensure_open()?;
        self.handlers
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> PortResult<()> {
        self.handlers.write().remove(topic);
        Ok(())
    }

    async fn close(&self) -> PortResult<()> {
        self.closed.store(true, Ordering::Release);
        self.handlers.write().clear();
        Ok(())
    }
}

/// [`EventStore`] backed by an append-only vector.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<Event>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, filter: &EventFilter) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .events
            .read()
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.timestamp);
        events
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn store(&self, event: Event) -> PortResult<()> {
        self.events.write().push(event);
        Ok(())
    }

    async fn query(&self, filter: &EventFilter) -> PortResult<Vec<Event>> {
        Ok(self.select(filter))
    }

    async fn get(&self, id: &str) -> PortResult<Event> {
        self.events
            .read()
            .iter()
            .find(|event| event.id == id)
            .cloned()
            .ok_or_else(|| PortError::not_found(format!("event '{id}'")))
    }

    async fn by_execution(&self, execution_id: &str) -> PortResult<Vec<Event>> {
        Ok(self.select(&EventFilter::new().for_execution(execution_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use chrono::{TimeDelta, Utc};
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<dyn EventHandler>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: Arc<dyn EventHandler> = Arc::new(move |event: Event| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(event.event_type.to_string());
                Ok::<(), PortError>(())
            }
        });
        (seen, handler)
    }

    #[tokio::test]
    async fn publish_reaches_topic_subscribers_only() {
        let bus = InMemoryEventBus::new();
        let (graph_events, graph_handler) = recorder();
        let (node_events, node_handler) = recorder();
        bus.subscribe("graphs", graph_handler).await.unwrap();
        bus.subscribe("nodes", node_handler).await.unwrap();

        bus.publish("graphs", Event::new(EventType::GraphStarted, "e1"))
            .await
            .unwrap();
        bus.publish("unknown", Event::new(EventType::GraphFailed, "e1"))
            .await
            .unwrap();

        assert_eq!(*graph_events.lock(), ["graph.started"]);
        assert!(node_events.lock().is_empty());
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_others() {
        let bus = InMemoryEventBus::new();
        let failing: Arc<dyn EventHandler> = Arc::new(|_: Event| async {
            Err::<(), _>(PortError::InvalidArgument("nope".to_string()))
        });
        let (seen, handler) = recorder();
        bus.subscribe("t", failing).await.unwrap();
        bus.subscribe("t", handler).await.unwrap();

        bus.publish("t", Event::new(EventType::NodeFailed, "e1"))
            .await
            .unwrap();
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_and_close() {
        let bus = InMemoryEventBus::new();
        let (seen, handler) = recorder();
        bus.subscribe("t", handler).await.unwrap();
        bus.unsubscribe("t").await.unwrap();
        bus.publish("t", Event::new(EventType::StateChanged, "e1"))
            .await
            .unwrap();
        assert!(seen.lock().is_empty());

        bus.close().await.unwrap();
        assert!(matches!(
            bus.publish("t", Event::new(EventType::StateChanged, "e1")).await,
            Err(PortError::Closed(_))
        ));
    }

    #[tokio::test]
    async fn store_queries_in_time_order() {
        let store = InMemoryEventStore::new();
        let t0 = Utc::now();
        let late = Event::new(EventType::NodeCompleted, "e1")
            .with_node("b")
            .at(t0 + TimeDelta::seconds(2));
        let early = Event::new(EventType::NodeStarted, "e1")
            .with_node("b")
            .at(t0);
        let other = Event::new(EventType::GraphStarted, "e2").at(t0);
        let late_id = late.id.clone();

        store.store(late).await.unwrap();
        store.store(early).await.unwrap();
        store.store(other).await.unwrap();

        let events = store.by_execution("e1").await.unwrap();
        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(types, [EventType::NodeStarted, EventType::NodeCompleted]);

        let filter = EventFilter::new()
            .of_type(EventType::NodeCompleted)
            .for_node("b");
        assert_eq!(store.query(&filter).await.unwrap().len(), 1);
        assert_eq!(store.get(&late_id).await.unwrap().event_type, EventType::NodeCompleted);
        assert!(store.get("missing").await.is_err());
    }
}
