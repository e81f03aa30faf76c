//! Shared contract layer for a graph-based task orchestrator.
//!
//! Workflows are directed graphs of executor and router nodes. This crate
//! models them, validates them, and defines the ports through which a
//! scheduler, workers and storage talk to each other.

pub use dago_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use dago_internal::prelude::*;
}
