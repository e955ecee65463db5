use super::types::*;
use crate::config::{expand_env_vars, expand_tilde};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse and validate config from YAML text.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    // Expand environment variables in the YAML string before parsing
    let yaml_string = expand_env_vars(yaml);

    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;

    if let Some(path) = config.input.path.as_mut() {
        *path = expand_tilde(path);
    }

    validate_config(&config)?;

    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    use regex::Regex;

    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    let mut unexpanded_vars: Vec<String> = re
        .captures_iter(yaml_string)
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with an actual value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables\n\
             2. Replace the variables in the config file with actual values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

/// Validates the output settings, reporting every problem at once.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let ws = &config.output.websocket;
    let mut errors = Vec::new();

    if ws.workers < 1 {
        errors.push("output.websocket.workers must be at least 1".to_string());
    }
    if ws.batch_size < 1 {
        errors.push("output.websocket.batch_size must be at least 1".to_string());
    }
    if ws.retry_limit < -1 {
        errors.push(format!(
            "output.websocket.retry_limit must be -1 (unlimited) or greater, got {}",
            ws.retry_limit
        ));
    }
    if ws.addr.trim().is_empty() {
        errors.push("output.websocket.addr must not be empty".to_string());
    }
    if ws.schema != "ws" && ws.schema != "wss" {
        errors.push(format!(
            "output.websocket.schema must be 'ws' or 'wss', got '{}'",
            ws.schema
        ));
    }
    if ws.ping_interval > MAX_PING_INTERVAL_SECS {
        errors.push(format!(
            "output.websocket.ping_interval must be at most {} seconds, got {}",
            MAX_PING_INTERVAL_SECS, ws.ping_interval
        ));
    }
    if ws.max_len < 1 {
        errors.push("output.websocket.max_len must be at least 1".to_string());
    }
    if config.input.flush_interval.is_zero() {
        errors.push("input.flush_interval must be greater than zero".to_string());
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(ConfigError::Validation(errors.remove(0))),
        _ => Err(ConfigError::ValidationList(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(
            r#"
output:
  websocket:
    addr: "127.0.0.1:8080"
"#,
        )
        .unwrap();

        let ws = &config.output.websocket;
        assert_eq!(ws.workers, 1);
        assert_eq!(ws.batch_size, 2048);
        assert_eq!(ws.retry_limit, 3);
        assert_eq!(ws.schema, "ws");
        assert_eq!(ws.path, "/");
        assert_eq!(ws.ping_interval, 30);
        assert_eq!(ws.max_len, 1024 * 1024);
        assert!(config.input.path.is_none());
        assert_eq!(config.input.flush_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
output:
  websocket:
    workers: 4
    batch_size: 100
    retry_limit: -1
    schema: wss
    addr: "logs.internal:9443"
    path: ingest
    ping_interval: 10
    max_len: 200
input:
  path: /var/log/events.ndjson
  flush_interval: 250ms
"#,
        )
        .unwrap();

        let ws = &config.output.websocket;
        assert_eq!(ws.workers, 4);
        assert_eq!(ws.batch_size, 100);
        assert_eq!(ws.retry_limit, -1);
        assert_eq!(ws.target_url(), "wss://logs.internal:9443/ingest");
        assert_eq!(ws.max_len, 200);
        assert_eq!(
            config.input.path.as_deref(),
            Some(Path::new("/var/log/events.ndjson"))
        );
        assert_eq!(config.input.flush_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_addr_is_parse_error() {
        let result = parse_config("output:\n  websocket:\n    workers: 2\n");
        assert!(matches!(result, Err(ConfigError::YamlParse(_))));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let result = parse_config(
            r#"
output:
  websocket:
    workers: 0
    batch_size: 0
    schema: http
    addr: "host:1"
"#,
        );

        match result {
            Err(ConfigError::ValidationList(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors[0].contains("workers"));
                assert!(errors[1].contains("batch_size"));
                assert!(errors[2].contains("schema"));
            }
            other => panic!("expected validation list, got {:?}", other),
        }
    }

    #[test]
    fn test_retry_limit_below_minus_one_rejected() {
        let result = parse_config(
            "output:\n  websocket:\n    addr: \"host:1\"\n    retry_limit: -2\n",
        );
        match result {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("retry_limit")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_ping_interval_upper_bound() {
        let result = parse_config(
            "output:\n  websocket:\n    addr: \"host:1\"\n    ping_interval: 18446744073709551615\n",
        );
        match result {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("ping_interval")),
            other => panic!("expected validation error, got {:?}", other),
        }

        let config = parse_config(&format!(
            "output:\n  websocket:\n    addr: \"host:1\"\n    ping_interval: {}\n",
            MAX_PING_INTERVAL_SECS
        ))
        .unwrap();
        assert_eq!(config.output.websocket.ping_interval, MAX_PING_INTERVAL_SECS);
    }

    #[test]
    fn test_env_var_expansion_in_addr() {
        std::env::set_var("LOGSOCKET_TEST_ADDR", "10.0.0.5:7000");
        let config = parse_config(
            "output:\n  websocket:\n    addr: \"$env{LOGSOCKET_TEST_ADDR}\"\n",
        )
        .unwrap();
        assert_eq!(config.output.websocket.addr, "10.0.0.5:7000");
        std::env::remove_var("LOGSOCKET_TEST_ADDR");
    }

    #[test]
    fn test_unset_env_var_is_reported() {
        let result = parse_config(
            "output:\n  websocket:\n    addr: \"$env{LOGSOCKET_DEFINITELY_UNSET}\"\n",
        );
        match result {
            Err(ConfigError::Validation(msg)) => {
                assert!(msg.contains("LOGSOCKET_DEFINITELY_UNSET"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
