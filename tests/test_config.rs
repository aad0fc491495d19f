use std::fs;
use tempfile::tempdir;
use topic_filter::config::{ConfigError, load_config, load_config_from_path};

#[test]
fn test_load_full_config() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("topic-filter.toml");
    fs::write(
        &path,
        r#"
query = "status=ok"

[consumer]
bootstrap_servers = "broker:9092"
group_id = "viewer"
sasl_username = "user"
sasl_password = "secret"
topic = "orders"
consumer_group_offset_utc_timestamp = "2026-01-01T00:00:00Z"

[schema_registry]
url = "https://registry.example"
password = "registry-secret"
"#,
    )
    .expect("write config");

    let cfg = load_config_from_path(&path).expect("config should load");
    assert_eq!(cfg.query, "status=ok");
    assert_eq!(cfg.consumer.topic.as_deref(), Some("orders"));
    assert_eq!(cfg.consumer.sasl_password.as_ref().map(|s| s.expose()), Some("secret"));
    assert!(cfg.consumer.offset_timestamp().unwrap().is_some());

    let debug = format!("{cfg:?}");
    assert!(!debug.contains("secret"));

    let printed = toml::to_string_pretty(&cfg.redacted()).unwrap();
    assert!(!printed.contains("registry-secret"));
    assert!(printed.contains("broker:9092"));
}

#[test]
fn test_missing_sections_use_defaults() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").expect("write config");

    let cfg = load_config(Some(&path)).expect("config should load");
    assert!(cfg.query.is_empty());
    assert!(cfg.consumer.bootstrap_servers.is_none());
}

#[test]
fn test_no_path_gives_defaults() {
    let cfg = load_config(None).expect("defaults");
    assert_eq!(cfg.topic_or_default(), "-");
}

#[test]
fn test_errors() {
    let dir = tempdir().expect("temp dir");

    let missing = load_config_from_path(&dir.path().join("nope.toml"));
    assert!(matches!(missing, Err(ConfigError::Read { .. })));

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "query = [").expect("write config");
    assert!(matches!(
        load_config_from_path(&bad),
        Err(ConfigError::Parse { .. })
    ));

    let bad_ts = dir.path().join("ts.toml");
    fs::write(
        &bad_ts,
        "[consumer]\nconsumer_group_offset_utc_timestamp = \"soon\"\n",
    )
    .expect("write config");
    assert!(matches!(
        load_config_from_path(&bad_ts),
        Err(ConfigError::InvalidTimestamp { .. })
    ));
}
