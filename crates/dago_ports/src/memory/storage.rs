use crate::clock::{ClockProvider, SystemClock};
use crate::error::{PortError, PortResult};
use crate::storage::StateStorage;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use core::time::Duration;
use dago_domain::State;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::Arc;

struct Entry {
    state: State,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// [`StateStorage`] backed by a hash map.
///
/// Expired entries are dropped lazily, on the next access.
pub struct InMemoryStateStorage {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn ClockProvider>,
}

impl core::fmt::Debug for InMemoryStateStorage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryStateStorage")
            .field("entries", &self.entries.read().len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryStateStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStateStorage {
    /// Creates an empty storage using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty storage using a custom clock for TTL checks.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn ClockProvider>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn purge_expired(&self, execution_id: &str) {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        if entries.get(execution_id).is_some_and(|e| !e.is_live(now)) {
            entries.remove(execution_id);
            tracing::debug!(execution_id, "expired state dropped");
        }
    }
}

#[async_trait]
impl StateStorage for InMemoryStateStorage {
    async fn save(&self, execution_id: &str, state: &State) -> PortResult<()> {
        self.entries.write().insert(
            execution_id.to_string(),
            Entry {
                state: state.clone(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn load(&self, execution_id: &str) -> PortResult<State> {
        self.purge_expired(execution_id);
        self.entries
            .read()
            .get(execution_id)
            .map(|entry| entry.state.clone())
            .ok_or_else(|| PortError::not_found(format!("state '{execution_id}'")))
    }

    async fn delete(&self, execution_id: &str) -> PortResult<()> {
        self.entries.write().remove(execution_id);
        Ok(())
    }

    async fn exists(&self, execution_id: &str) -> PortResult<bool> {
        self.purge_expired(execution_id);
        Ok(self.entries.read().contains_key(execution_id))
    }

    async fn set_ttl(&self, execution_id: &str, ttl: Duration) -> PortResult<()> {
        self.purge_expired(execution_id);
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|_| PortError::InvalidArgument(format!("ttl {ttl:?} out of range")))?;
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(execution_id)
            .ok_or_else(|| PortError::not_found(format!("state '{execution_id}'")))?;
        entry.expires_at = Some(now + ttl);
        Ok(())
    }

    async fn list(&self) -> PortResult<Vec<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!(dropped, "expired states dropped");
        }
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn state(value: i64) -> State {
        let mut state = State::new();
        state.set("value", value);
        state
    }

    #[tokio::test]
    async fn save_load_delete() {
        let storage = InMemoryStateStorage::new();
        storage.save("exec-1", &state(1)).await.unwrap();

        assert!(storage.exists("exec-1").await.unwrap());
        assert_eq!(storage.load("exec-1").await.unwrap().get_i64("value"), Some(1));

        storage.save("exec-1", &state(2)).await.unwrap();
        assert_eq!(storage.load("exec-1").await.unwrap().get_i64("value"), Some(2));

        storage.delete("exec-1").await.unwrap();
        assert!(!storage.exists("exec-1").await.unwrap());
        assert!(matches!(
            storage.load("exec-1").await,
            Err(PortError::NotFound(_))
        ));
        storage.delete("exec-1").await.unwrap();
    }

    #[tokio::test]
    async fn ttl_expires_lazily() {
        let clock = Arc::new(MockClock::new(Utc::now()));
        let storage = InMemoryStateStorage::with_clock(clock.clone());
        storage.save("a", &state(1)).await.unwrap();
        storage.save("b", &state(2)).await.unwrap();
        storage.set_ttl("a", Duration::from_secs(10)).await.unwrap();

        clock.advance(TimeDelta::seconds(9));
        assert!(storage.exists("a").await.unwrap());

        clock.advance(TimeDelta::seconds(1));
        assert!(!storage.exists("a").await.unwrap());
        assert_eq!(storage.list().await.unwrap(), ["b"]);
        assert!(storage.set_ttl("a", Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn save_clears_ttl() {
        let clock = Arc::new(MockClock::new(Utc::now()));
        let storage = InMemoryStateStorage::with_clock(clock.clone());
        storage.save("a", &state(1)).await.unwrap();
        storage.set_ttl("a", Duration::from_secs(1)).await.unwrap();
        storage.save("a", &state(2)).await.unwrap();

        clock.advance(TimeDelta::seconds(5));
        assert!(storage.exists("a").await.unwrap());
    }

    #[tokio::test]
    async fn list_drops_expired_entries() {
        let clock = Arc::new(MockClock::new(Utc::now()));
        let storage = InMemoryStateStorage::with_clock(clock.clone());
        for id in ["a", "b", "c"] {
            storage.save(id, &state(1)).await.unwrap();
        }
        storage.set_ttl("a", Duration::from_secs(1)).await.unwrap();
        storage.set_ttl("c", Duration::from_secs(1)).await.unwrap();

        clock.advance(TimeDelta::seconds(2));
        assert_eq!(storage.list().await.unwrap(), ["b"]);
        assert_eq!(storage.entries.read().len(), 1);
    }
}
