//! Ambient plumbing shared by dago services.
//!
//! - [`config`] - Environment-driven [`Config`](config::Config) and duration parsing
//! - [`logging`] - `tracing` subscriber setup and context spans
//! - [`trace`] - Span bookkeeping that can cross process boundaries

pub mod config;
pub mod logging;
pub mod trace;

pub use config::{Config, ConfigError, Env};
pub use logging::{LogFormat, LogLevel, LoggerConfig};
pub use trace::{Span, SpanContext, SpanEvent, SpanStatus, Tracer};
