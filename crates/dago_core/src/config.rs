//! Environment-driven configuration.
//!
//! Every value has a default; a variable that is unset, empty or
//! unparseable leaves the default in place. Lookups go through an
//! [`Env`], so tests can supply variables without touching the process
//! environment.
//!
//! # Example
//!
//! ```
//! use core::time::Duration;
//! use dago_core::config::{Config, Env};
//!
//! let env = Env::from_pairs([("SERVICE_NAME", "router"), ("LLM_TIMEOUT", "90s")]);
//! let config = Config::from_source(&env);
//! assert_eq!(config.service_name, "router");
//! assert_eq!(config.llm_timeout, Duration::from_secs(90));
//! assert_eq!(config.redis_addr, "localhost:6379");
//! config.validate()?;
//! # Ok::<(), dago_core::config::ConfigError>(())
//! ```

use crate::logging::{LogFormat, LogLevel, LoggerConfig};
use core::str::FromStr;
use core::time::Duration;
use std::collections::HashMap;

/// Errors raised while reading or checking configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("required environment variable {0} is not set")]
    Missing(String),

    /// A duration string could not be parsed.
    #[error("invalid duration {value:?}: {reason}")]
    InvalidDuration {
        /// The offending input.
        value: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A loaded configuration is inconsistent.
    #[error("{0}")]
    Invalid(&'static str),
}

// ─────────────────────────────────────────────────────────────────────────────
// Env
// ─────────────────────────────────────────────────────────────────────────────

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A source of configuration variables.
pub struct Env {
    lookup: Lookup,
}

impl core::fmt::Debug for Env {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Env").finish_non_exhaustive()
    }
}

impl Env {
    /// Reads from the process environment.
    #[must_use]
    pub fn process() -> Self {
        Self::new(|key| std::env::var(key).ok())
    }

    /// Reads through an arbitrary lookup function.
    #[must_use]
    pub fn new(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Reads from a fixed set of pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(move |key| vars.get(key).cloned())
    }

    /// Returns the value of `key`, treating an empty value as unset.
    #[must_use]
    pub fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }

    /// Returns `key` or `default`.
    #[must_use]
    pub fn get(&self, key: &str, default: &str) -> String {
        self.var(key).unwrap_or_else(|| default.to_string())
    }

    /// Returns `key` parsed as `T`, or `default` if unset or unparseable.
    #[must_use]
    pub fn parsed<T: FromStr>(&self, key: &str, default: T) -> T {
        self.var(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Returns `key` as a boolean.
    ///
    /// Accepts `true`, `1`, `yes`, `on` and `false`, `0`, `no`, `off` in any
    /// case; anything else yields `default`.
    #[must_use]
    pub fn bool(&self, key: &str, default: bool) -> bool {
        self.var(key)
            .and_then(|value| parse_bool(&value))
            .unwrap_or(default)
    }

    /// Returns `key` parsed with [`parse_duration`], or `default`.
    #[must_use]
    pub fn duration(&self, key: &str, default: Duration) -> Duration {
        self.var(key)
            .and_then(|value| parse_duration(&value).ok())
            .unwrap_or(default)
    }

    /// Returns `key` or an error if it is unset.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`].
    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.var(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }
}

// ─── Process environment shorthands ───

/// Reads `key` from the process environment, or `default`.
#[must_use]
pub fn get_env(key: &str, default: &str) -> String {
    Env::process().get(key, default)
}

/// Reads and parses `key` from the process environment, or `default`.
#[must_use]
pub fn get_env_parsed<T: FromStr>(key: &str, default: T) -> T {
    Env::process().parsed(key, default)
}

/// Reads a boolean from the process environment, or `default`.
#[must_use]
pub fn get_env_bool(key: &str, default: bool) -> bool {
    Env::process().bool(key, default)
}

/// Reads a duration from the process environment, or `default`.
#[must_use]
pub fn get_env_duration(key: &str, default: Duration) -> Duration {
    Env::process().duration(key, default)
}

/// Reads a required variable from the process environment.
///
/// # Errors
///
/// [`ConfigError::Missing`] if it is unset or empty.
pub fn require_env(key: &str) -> Result<String, ConfigError> {
    Env::process().require(key)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Durations
// ─────────────────────────────────────────────────────────────────────────────

/// Parses a duration such as `300ms`, `1.5h` or `2h45m`.
///
/// The input is a sequence of decimal numbers, each with a unit suffix
/// (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`). A bare `0` is also accepted.
/// Negative durations are rejected.
///
/// # Errors
///
/// [`ConfigError::InvalidDuration`] describing the first problem found.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError::InvalidDuration {
        value: input.to_string(),
        reason,
    };

    let mut rest = input.trim();
    if let Some(unsigned) = rest.strip_prefix('+') {
        rest = unsigned;
    } else if rest.starts_with('-') {
        return Err(invalid("negative durations are not supported"));
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut total_nanos: f64 = 0.0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return Err(invalid("expected a number"));
        }
        let number: f64 = number.parse().map_err(|_| invalid("malformed number"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid("unknown unit")),
        };
        total_nanos += number * scale;
        rest = tail;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(invalid("duration out of range"));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// Settings shared by every dago component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Redis address (`REDIS_ADDR`).
    pub redis_addr: String,
    /// Redis password (`REDIS_PASSWORD`).
    pub redis_password: String,
    /// Redis database index (`REDIS_DB`).
    pub redis_db: u32,
    /// Log level (`LOG_LEVEL`).
    pub log_level: LogLevel,
    /// Log format (`LOG_FORMAT`).
    pub log_format: LogFormat,
    /// Whether metrics are exposed (`METRICS_ENABLED`).
    pub metrics_enabled: bool,
    /// Metrics endpoint port (`METRICS_PORT`).
    pub metrics_port: u32,
    /// Service name used in logs and spans (`SERVICE_NAME`).
    pub service_name: String,
    /// Service port (`SERVICE_PORT`).
    pub service_port: u32,
    /// Default operation timeout (`DEFAULT_TIMEOUT`).
    pub default_timeout: Duration,
    /// Timeout for LLM calls (`LLM_TIMEOUT`).
    pub llm_timeout: Duration,
    /// Timeout for tool executions (`TOOL_TIMEOUT`).
    pub tool_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_addr: "localhost:6379".to_string(),
            redis_password: String::new(),
            redis_db: 0,
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
            metrics_enabled: true,
            metrics_port: 9090,
            service_name: "dago".to_string(),
            service_port: 8080,
            default_timeout: Duration::from_secs(5 * 60),
            llm_timeout: Duration::from_secs(2 * 60),
            tool_timeout: Duration::from_secs(5 * 60),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_source(&Env::process())
    }

    /// Loads configuration from `env`, falling back to defaults.
    #[must_use]
    pub fn from_source(env: &Env) -> Self {
        let defaults = Self::default();
        let config = Self {
            redis_addr: env.get("REDIS_ADDR", &defaults.redis_addr),
            redis_password: env.get("REDIS_PASSWORD", &defaults.redis_password),
            redis_db: env.parsed("REDIS_DB", defaults.redis_db),
            log_level: env
                .var("LOG_LEVEL")
                .map_or(defaults.log_level, |value| LogLevel::parse(&value)),
            log_format: env
                .var("LOG_FORMAT")
                .map_or(defaults.log_format, |value| LogFormat::parse(&value)),
            metrics_enabled: env.bool("METRICS_ENABLED", defaults.metrics_enabled),
            metrics_port: env.parsed("METRICS_PORT", defaults.metrics_port),
            service_name: env.get("SERVICE_NAME", &defaults.service_name),
            service_port: env.parsed("SERVICE_PORT", defaults.service_port),
            default_timeout: env.duration("DEFAULT_TIMEOUT", defaults.default_timeout),
            llm_timeout: env.duration("LLM_TIMEOUT", defaults.llm_timeout),
            tool_timeout: env.duration("TOOL_TIMEOUT", defaults.tool_timeout),
        };
        tracing::debug!(
            service = %config.service_name,
            redis = %config.redis_addr,
            "configuration loaded"
        );
        config
    }

    /// Checks that the loaded values are usable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_addr.is_empty() {
            return Err(ConfigError::Invalid("redis address cannot be empty"));
        }
        if !(1..=65535).contains(&self.service_port) {
            return Err(ConfigError::Invalid(
                "service port must be between 1 and 65535",
            ));
        }
        if !(1..=65535).contains(&self.metrics_port) {
            return Err(ConfigError::Invalid(
                "metrics port must be between 1 and 65535",
            ));
        }
        Ok(())
    }

    /// Returns the logger settings derived from this configuration.
    #[must_use]
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig::new()
            .with_level(self.log_level)
            .with_format(self.log_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_count_as_unset() {
        let env = Env::from_pairs([("A", ""), ("B", "x")]);
        assert_eq!(env.var("A"), None);
        assert_eq!(env.get("A", "dflt"), "dflt");
        assert_eq!(env.get("B", "dflt"), "x");
        assert_eq!(env.require("A"), Err(ConfigError::Missing("A".to_string())));
        assert_eq!(env.require("B").unwrap(), "x");
    }

    #[test]
    fn bools_accept_any_case() {
        for yes in ["true", "1", "YES", "On", "True"] {
            assert!(Env::from_pairs([("F", yes)]).bool("F", false), "{yes}");
        }
        for no in ["false", "0", "no", "OFF"] {
            assert!(!Env::from_pairs([("F", no)]).bool("F", true), "{no}");
        }
        assert!(Env::from_pairs([("F", "maybe")]).bool("F", true));
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let env = Env::from_pairs([("N", "abc"), ("M", " 42 ")]);
        assert_eq!(env.parsed("N", 7_u32), 7);
        assert_eq!(env.parsed("M", 7_u32), 42);
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(
            parse_duration("2h45m").unwrap(),
            Duration::from_secs(2 * 3600 + 45 * 60)
        );
        assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("+5s").unwrap(), Duration::from_secs(5));

        for bad in ["", "5", "-5s", "5d", "s", "1..5s", "h5"] {
            assert!(
                matches!(parse_duration(bad), Err(ConfigError::InvalidDuration { .. })),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn validate_rejects_bad_settings() {
        assert!(Config::default().validate().is_ok());

        let no_redis = Config {
            redis_addr: String::new(),
            ..Config::default()
        };
        assert_eq!(
            no_redis.validate().unwrap_err().to_string(),
            "redis address cannot be empty"
        );

        let bad_port = Config {
            service_port: 70_000,
            ..Config::default()
        };
        assert!(bad_port.validate().is_err());

        let zero_metrics = Config {
            metrics_port: 0,
            ..Config::default()
        };
        assert_eq!(
            zero_metrics.validate().unwrap_err().to_string(),
            "metrics port must be between 1 and 65535"
        );
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            #[test]
            fn prop_compound_durations_sum(h in 0u64..100, m in 0u64..60, s in 0u64..60, ms in 0u64..1000) {
                let text = format!("{h}h{m}m{s}s{ms}ms");
                let expected = Duration::from_secs(h * 3600 + m * 60 + s) + Duration::from_millis(ms);
                prop_assert_eq!(parse_duration(&text).unwrap(), expected);
            }

            #[test]
            fn prop_garbage_never_panics(input in "\\PC{0,12}") {
                let _ = parse_duration(&input);
            }
        }
    }
}
