//! Subscriber setup and context spans.
//!
//! All crates log through `tracing`. A binary calls [`LoggerConfig::init`]
//! once at startup; libraries only emit events. Context such as the graph,
//! execution or node being processed is attached with the span helpers
//! below rather than repeated on every event.

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// LogLevel / LogFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Minimum severity that is emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Detailed debugging information.
    Debug,
    /// General operational messages.
    #[default]
    Info,
    /// Something unexpected that the system recovered from.
    Warn,
    /// A failed operation.
    Error,
}

impl LogLevel {
    /// Parses a level name, case-insensitively. Unknown names yield `Info`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    /// Returns the matching `tracing` level.
    #[must_use]
    pub const fn as_level(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Output format of the subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact single-line output.
    #[default]
    Text,
    /// Human-readable multi-line colored output.
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively. Unknown names yield `Text`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Text,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LoggerConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Subscriber configuration.
///
/// # Example
///
/// ```
/// use dago_core::logging::{LogFormat, LogLevel, LoggerConfig};
///
/// LoggerConfig::new()
///     .with_level(LogLevel::Debug)
///     .with_format(LogFormat::Json)
///     .with_env_filter("dago=debug,hyper=warn")
///     .init();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Minimum level when no filter directive is given.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Target-specific directives, e.g. `dago=debug,hyper=warn`.
    pub env_filter: Option<String>,
    /// Emit span enter/exit events.
    pub span_events: bool,
    /// Include source file and line in each event.
    pub add_source: bool,
}

impl LoggerConfig {
    /// Creates the default configuration (`info`, text).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum level.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets target-specific filter directives.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Includes source locations in the output.
    #[must_use]
    pub fn with_source(mut self, enabled: bool) -> Self {
        self.add_source = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        let level = self.level.as_level();
        match &self.env_filter {
            Some(directives) => {
                EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(level.as_str()))
            }
            None => EnvFilter::new(level.as_str()),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Only the first call in a process takes effect; later calls are
    /// ignored.
    pub fn init(&self) {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init().ok() ignores errors if already initialized
        match self.format {
            LogFormat::Text => {
                tracing_subscriber::registry()
                    .with(self.filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_file(self.add_source)
                            .with_line_number(self.add_source)
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(self.filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_file(self.add_source)
                            .with_line_number(self.add_source)
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(self.filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_file(self.add_source)
                            .with_line_number(self.add_source)
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }

        tracing::info!(level = ?self.level, format = ?self.format, "logging initialized");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context spans
// ─────────────────────────────────────────────────────────────────────────────

/// Span carrying `graph_id`.
#[must_use]
pub fn graph_span(graph_id: &str) -> tracing::Span {
    tracing::info_span!("graph", graph_id)
}

/// Span carrying `execution_id`.
#[must_use]
pub fn execution_span(execution_id: &str) -> tracing::Span {
    tracing::info_span!("execution", execution_id)
}

/// Span carrying `execution_id` and `node_id`.
#[must_use]
pub fn node_span(execution_id: &str, node_id: &str) -> tracing::Span {
    tracing::info_span!("node", execution_id, node_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(LogLevel::parse("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("warn"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("Error"), LogLevel::Error);
        assert_eq!(LogLevel::parse("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::Warn.as_level(), Level::WARN);
    }

    #[test]
    fn formats_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("Pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Text);
    }

    #[test]
    fn bad_filter_falls_back_to_level() {
        let config = LoggerConfig::new()
            .with_level(LogLevel::Error)
            .with_env_filter("dago=loud");
        assert_eq!(
            config.filter().max_level_hint(),
            Some(tracing::level_filters::LevelFilter::ERROR)
        );
    }

    #[test]
    fn init_twice_is_harmless() {
        let config = LoggerConfig::new().with_format(LogFormat::Json);
        config.init();
        config.init();
        let _guard = node_span("exec-1", "classify").entered();
        tracing::info!("inside node span");
    }
}
