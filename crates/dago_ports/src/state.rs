//! State evolution port: initialization, atomic updates, snapshots and an
//! audit log of transitions.

use crate::error::PortResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dago_domain::{State, StateError};
use serde::{Deserialize, Serialize};

/// Update function applied by [`StateManager::update`].
pub type StateUpdate = Box<dyn FnOnce(State) -> Result<State, StateError> + Send>;

/// Manages the state of running executions.
#[async_trait]
pub trait StateManager: Send + Sync + 'static {
    /// Creates the state of `execution_id` from `initial`.
    async fn initialize(&self, execution_id: &str, initial: State) -> PortResult<()>;

    /// Returns the current state of `execution_id`.
    async fn get(&self, execution_id: &str) -> PortResult<State>;

    /// Replaces the state with the result of `update`.
    ///
    /// If `update` fails the stored state is unchanged and the error is
    /// returned as [`PortError::State`](crate::PortError::State).
    async fn update(&self, execution_id: &str, update: StateUpdate) -> PortResult<()>;

    /// Deletes the state and snapshots of `execution_id`.
    async fn delete(&self, execution_id: &str) -> PortResult<()>;

    /// Saves the current state under `name`.
    async fn save_snapshot(&self, execution_id: &str, name: &str) -> PortResult<()>;

    /// Returns the snapshot saved under `name`.
    async fn load_snapshot(&self, execution_id: &str, name: &str) -> PortResult<State>;

    /// Returns the snapshot names of `execution_id`.
    async fn list_snapshots(&self, execution_id: &str) -> PortResult<Vec<String>>;
}

/// One state change made by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Execution the change belongs to.
    pub execution_id: String,
    /// Node that made the change.
    pub node_id: String,
    /// State before.
    pub from_state: State,
    /// State after.
    pub to_state: State,
    /// When the change happened.
    pub timestamp: DateTime<Utc>,
}

/// Records state transitions for debugging, auditing and replay.
#[async_trait]
pub trait TransitionLogger: Send + Sync + 'static {
    /// Appends a transition.
    async fn log_transition(&self, transition: Transition) -> PortResult<()>;

    /// Returns every transition of `execution_id`, oldest first.
    async fn transitions(&self, execution_id: &str) -> PortResult<Vec<Transition>>;

    /// Returns the transitions of `execution_id` strictly after `since`.
    async fn transitions_since(
        &self,
        execution_id: &str,
        since: DateTime<Utc>,
    ) -> PortResult<Vec<Transition>>;
}
