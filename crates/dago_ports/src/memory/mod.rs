//! In-memory reference implementations of the ports.
//!
//! These let consumers test against the port contracts without Redis,
//! Kafka or a real tool runtime. They are not production infrastructure:
//! nothing is persisted and every lock is process-local.

mod events;
mod storage;
mod tools;
mod workers;

pub use events::{InMemoryEventBus, InMemoryEventStore};
pub use storage::InMemoryStateStorage;
pub use tools::InMemoryToolRegistry;
pub use workers::InMemoryWorkerRegistry;
