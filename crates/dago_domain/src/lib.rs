//! Domain types for dago.
//!
//! - [`error`] - Error taxonomy shared by every crate
//! - [`state`] - Key/value execution state
//! - [`execution`] - Graph and node execution records

pub mod error;
pub mod execution;
pub mod state;

pub use error::{BoxError, DomainError, ExecutionError, StateError, ToolError, ValidationError};
pub use execution::{ExecutionStatus, GraphState, NodeState, UnknownStatus};
pub use state::State;
