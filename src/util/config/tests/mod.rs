//! 配置模块单元测试

use std::collections::HashMap;

use crate::util::config::{AppConfig, ConfigError, ENV_LOG, ENV_NUM_WORKERS};
use crate::util::logger::LogLevel;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert!(config.scheduler.num_workers >= 1);
    assert_eq!(config.scheduler.thread_name_prefix, "tasksys-worker");
    assert_eq!(config.scheduler.stack_size, None);
    assert_eq!(config.log.level, LogLevel::Info);
}

#[test]
fn test_parse_full_file() {
    let config = AppConfig::from_toml_str(
        r#"
        [scheduler]
        num_workers = 3
        thread_name_prefix = "pool"
        stack_size = 1048576

        [log]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.scheduler.num_workers, 3);
    assert_eq!(config.scheduler.thread_name_prefix, "pool");
    assert_eq!(config.scheduler.stack_size, Some(1048576));
    assert_eq!(config.log.level, LogLevel::Debug);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let config = AppConfig::from_toml_str("[scheduler]\nnum_workers = 2\n").unwrap();
    assert_eq!(config.scheduler.num_workers, 2);
    assert_eq!(config.scheduler.thread_name_prefix, "tasksys-worker");
    assert_eq!(config.log.level, LogLevel::Info);
}

#[test]
fn test_parse_error() {
    let err = AppConfig::from_toml_str("[scheduler]\nnum_workers = \"many\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_env_overrides_file() {
    let mut config = AppConfig::from_toml_str("[scheduler]\nnum_workers = 2\n").unwrap();
    config
        .apply_env_with(env(&[(ENV_NUM_WORKERS, " 6 "), (ENV_LOG, "WARN")]))
        .unwrap();
    assert_eq!(config.scheduler.num_workers, 6);
    assert_eq!(config.log.level, LogLevel::Warn);
}

#[test]
fn test_env_invalid_value() {
    let mut config = AppConfig::default();
    let err = config
        .apply_env_with(env(&[(ENV_NUM_WORKERS, "lots")]))
        .unwrap_err();
    match err {
        ConfigError::InvalidValue { key, value } => {
            assert_eq!(key, ENV_NUM_WORKERS);
            assert_eq!(value, "lots");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_file() {
    let err = AppConfig::from_file(std::path::Path::new("/nonexistent/tasksys.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("tasksys.toml"));
}

#[test]
fn test_toml_roundtrip() {
    let mut config = AppConfig::default();
    config.scheduler.num_workers = 5;
    config.log.level = LogLevel::Trace;
    let text = config.to_toml_string().unwrap();
    assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
}
