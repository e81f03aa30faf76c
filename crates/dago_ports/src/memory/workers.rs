use crate::clock::{ClockProvider, SystemClock};
use crate::error::{PortError, PortResult};
use crate::worker_registry::{
    WorkerFilter, WorkerInfo, WorkerRegistry, WorkerStats, WorkerStatus, WorkerType,
};
use async_trait::async_trait;
use core::time::Duration;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Heartbeat age after which a worker is no longer listed as healthy.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`WorkerRegistry`] backed by an insertion-ordered map.
pub struct InMemoryWorkerRegistry {
    workers: RwLock<IndexMap<String, WorkerInfo>>,
    clock: Arc<dyn ClockProvider>,
    heartbeat_timeout: Duration,
}

impl core::fmt::Debug for InMemoryWorkerRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let ids: Vec<String> = self.workers.read().keys().cloned().collect();
        f.debug_struct("InMemoryWorkerRegistry")
            .field("workers", &ids)
            .field("heartbeat_timeout", &self.heartbeat_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryWorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWorkerRegistry {
    /// Creates an empty registry using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty registry using a custom clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn ClockProvider>) -> Self {
        Self {
            workers: RwLock::new(IndexMap::new()),
            clock,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        }
    }

    /// Sets the heartbeat age used by [`WorkerFilter::healthy_only`].
    #[must_use]
    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }
}

fn unknown_worker(worker_id: &str) -> PortError {
    PortError::not_found(format!("worker '{worker_id}'"))
}

#[async_trait]
impl WorkerRegistry for InMemoryWorkerRegistry {
    async fn register(&self, mut worker: WorkerInfo) -> PortResult<()> {
        let now = self.clock.now();
        let mut workers = self.workers.write();
        if workers.contains_key(&worker.id) {
            return Err(PortError::AlreadyExists(format!("worker '{}'", worker.id)));
        }
        worker.registered_at = now;
        worker.last_heartbeat = now;
        tracing::info!(worker_id = %worker.id, worker_type = %worker.worker_type, "worker registered");
        workers.insert(worker.id.clone(), worker);
        Ok(())
    }

    async fn unregister(&self, worker_id: &str) -> PortResult<()> {
        self.workers
            .write()
            .shift_remove(worker_id)
            .map(|_| tracing::info!(worker_id, "worker unregistered"))
            .ok_or_else(|| unknown_worker(worker_id))
    }

    async fn heartbeat(
        &self,
        worker_id: &str,
        status: WorkerStatus,
        current_task: Option<&str>,
    ) -> PortResult<()> {
        let now = self.clock.now();
        let mut workers = self.workers.write();
        let worker = workers
            .get_mut(worker_id)
            .ok_or_else(|| unknown_worker(worker_id))?;
        worker.status = status;
        worker.current_task = current_task.map(str::to_string);
        worker.last_heartbeat = now;
        Ok(())
    }

    async fn get(&self, worker_id: &str) -> PortResult<WorkerInfo> {
        self.workers
            .read()
            .get(worker_id)
            .cloned()
            .ok_or_else(|| unknown_worker(worker_id))
    }

    async fn list(&self, filter: &WorkerFilter) -> PortResult<Vec<WorkerInfo>> {
        let now = self.clock.now();
        Ok(self
            .workers
            .read()
            .values()
            .filter(|worker| filter.matches(worker, now, self.heartbeat_timeout))
            .cloned()
            .collect())
    }

    async fn stats(&self, worker_type: WorkerType) -> PortResult<WorkerStats> {
        Ok(WorkerStats::collect(worker_type, self.workers.read().values()))
    }

    async fn cleanup_stale(&self, timeout: Duration) -> PortResult<usize> {
        let now = self.clock.now();
        let mut workers = self.workers.write();
        let before = workers.len();
        workers.retain(|id, worker| {
            let alive = worker.is_alive(now, timeout);
            if !alive {
                tracing::warn!(worker_id = %id, last_heartbeat = %worker.last_heartbeat, "removing stale worker");
            }
            alive
        });
        Ok(before - workers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use chrono::{TimeDelta, Utc};

    fn registry() -> (Arc<MockClock>, InMemoryWorkerRegistry) {
        let clock = Arc::new(MockClock::new(Utc::now()));
        let registry = InMemoryWorkerRegistry::with_clock(clock.clone());
        (clock, registry)
    }

    #[tokio::test]
    async fn register_heartbeat_get() {
        let (clock, registry) = registry();
        registry
            .register(WorkerInfo::new("w1", WorkerType::Executor))
            .await
            .unwrap();
        assert!(matches!(
            registry.register(WorkerInfo::new("w1", WorkerType::Router)).await,
            Err(PortError::AlreadyExists(_))
        ));

        clock.advance(TimeDelta::seconds(5));
        registry
            .heartbeat("w1", WorkerStatus::Busy, Some("task-7"))
            .await
            .unwrap();

        let worker = registry.get("w1").await.unwrap();
        assert_eq!(worker.status, WorkerStatus::Busy);
        assert_eq!(worker.current_task.as_deref(), Some("task-7"));
        assert_eq!(worker.last_heartbeat - worker.registered_at, TimeDelta::seconds(5));

        assert!(registry.heartbeat("ghost", WorkerStatus::Idle, None).await.is_err());
    }

    #[tokio::test]
    async fn list_filters_and_stats() {
        let (clock, registry) = registry();
        for (id, ty) in [
            ("e1", WorkerType::Executor),
            ("e2", WorkerType::Executor),
            ("r1", WorkerType::Router),
        ] {
            registry.register(WorkerInfo::new(id, ty)).await.unwrap();
        }
        registry.heartbeat("e2", WorkerStatus::Busy, Some("t")).await.unwrap();

        let executors = registry
            .list(&WorkerFilter::new().of_type(WorkerType::Executor))
            .await
            .unwrap();
        assert_eq!(executors.len(), 2);

        clock.advance(TimeDelta::seconds(31));
        registry.heartbeat("e1", WorkerStatus::Idle, None).await.unwrap();
        let healthy = registry
            .list(&WorkerFilter::new().healthy_only())
            .await
            .unwrap();
        let ids: Vec<_> = healthy.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, ["e1"]);

        let stats = registry.stats(WorkerType::Executor).await.unwrap();
        assert_eq!(stats.total_workers, 2);
        assert_eq!(stats.idle_workers, 1);
        assert_eq!(stats.busy_workers, 1);
    }

    #[tokio::test]
    async fn cleanup_removes_only_stale_workers() {
        let (clock, registry) = registry();
        registry.register(WorkerInfo::new("old", WorkerType::Executor)).await.unwrap();
        clock.advance(TimeDelta::seconds(20));
        registry.register(WorkerInfo::new("new", WorkerType::Executor)).await.unwrap();
        clock.advance(TimeDelta::seconds(15));

        let removed = registry.cleanup_stale(Duration::from_secs(30)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(registry.get("old").await.is_err());
        assert!(registry.get("new").await.is_ok());

        registry.unregister("new").await.unwrap();
        assert!(registry.unregister("new").await.is_err());
    }
}
