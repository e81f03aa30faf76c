//! Integration tests for environment configuration.
//!
//! Tests cover:
//! - Defaults when nothing is set
//! - Every variable overriding its field
//! - Fallback on unparseable values
//! - Deriving logger settings from the configuration

use core::time::Duration;
use dago_core::{Config, Env, LogFormat, LogLevel};

#[test]
fn defaults_when_unset() {
    let config = Config::from_source(&Env::new(|_| None));
    assert_eq!(config, Config::default());
    assert_eq!(config.redis_addr, "localhost:6379");
    assert_eq!(config.redis_db, 0);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.log_format, LogFormat::Text);
    assert!(config.metrics_enabled);
    assert_eq!(config.metrics_port, 9090);
    assert_eq!(config.service_name, "dago");
    assert_eq!(config.service_port, 8080);
    assert_eq!(config.default_timeout, Duration::from_secs(300));
    assert_eq!(config.llm_timeout, Duration::from_secs(120));
    assert_eq!(config.tool_timeout, Duration::from_secs(300));
}

#[test]
fn every_variable_overrides() {
    let env = Env::from_pairs([
        ("REDIS_ADDR", "redis:6380"),
        ("REDIS_PASSWORD", "secret"),
        ("REDIS_DB", "3"),
        ("LOG_LEVEL", "debug"),
        ("LOG_FORMAT", "json"),
        ("METRICS_ENABLED", "off"),
        ("METRICS_PORT", "9100"),
        ("SERVICE_NAME", "executor"),
        ("SERVICE_PORT", "8081"),
        ("DEFAULT_TIMEOUT", "1m30s"),
        ("LLM_TIMEOUT", "45s"),
        ("TOOL_TIMEOUT", "1.5h"),
    ]);
    let config = Config::from_source(&env);

    assert_eq!(config.redis_addr, "redis:6380");
    assert_eq!(config.redis_password, "secret");
    assert_eq!(config.redis_db, 3);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.log_format, LogFormat::Json);
    assert!(!config.metrics_enabled);
    assert_eq!(config.metrics_port, 9100);
    assert_eq!(config.service_name, "executor");
    assert_eq!(config.service_port, 8081);
    assert_eq!(config.default_timeout, Duration::from_secs(90));
    assert_eq!(config.llm_timeout, Duration::from_secs(45));
    assert_eq!(config.tool_timeout, Duration::from_secs(5400));
    config.validate().unwrap();

    let logger = config.logger_config();
    assert_eq!(logger.level, LogLevel::Debug);
    assert_eq!(logger.format, LogFormat::Json);
}

#[test]
fn garbage_falls_back_to_defaults() {
    let env = Env::from_pairs([
        ("REDIS_DB", "three"),
        ("METRICS_ENABLED", "sometimes"),
        ("SERVICE_PORT", "-1"),
        ("LLM_TIMEOUT", "soon"),
        ("LOG_LEVEL", "chatty"),
    ]);
    let config = Config::from_source(&env);
    assert_eq!(config.redis_db, 0);
    assert!(config.metrics_enabled);
    assert_eq!(config.service_port, 8080);
    assert_eq!(config.llm_timeout, Duration::from_secs(120));
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn out_of_range_port_fails_validation() {
    let config = Config::from_source(&Env::from_pairs([("METRICS_PORT", "70000")]));
    assert_eq!(config.metrics_port, 70_000);
    assert!(config.validate().is_err());
}
