use logsocket::config::{generate::generate_starter_config, load_config, ConfigError};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_generated_config_is_valid() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    fs::write(&config_path, generate_starter_config()).unwrap();

    let config = load_config(&config_path).expect("Generated config should be valid");
    let ws = &config.output.websocket;

    assert_eq!(ws.workers, 1);
    assert_eq!(ws.batch_size, 2048);
    assert_eq!(ws.retry_limit, 3);
    assert_eq!(ws.target_url(), "ws://127.0.0.1:8080/");
    assert_eq!(ws.ping_interval, 30);
    assert_eq!(ws.max_len, 1048576);
    assert!(config.input.path.is_none());
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = load_config(&temp_dir.path().join("absent.yml"));

    match result {
        Err(ConfigError::Io(e)) => assert!(e.to_string().contains("absent.yml")),
        other => panic!("expected io error, got {:?}", other),
    }
}

#[test]
fn test_invalid_yaml_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    fs::write(&config_path, "output: [this is: not valid").unwrap();

    assert!(matches!(
        load_config(&config_path),
        Err(ConfigError::YamlParse(_))
    ));
}

#[test]
fn test_input_path_tilde_is_expanded() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    fs::write(
        &config_path,
        "output:\n  websocket:\n    addr: \"host:1\"\ninput:\n  path: ~/events.ndjson\n",
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let path = config.input.path.unwrap();
    if let Some(home) = dirs::home_dir() {
        assert_eq!(path, home.join("events.ndjson"));
    }
}
