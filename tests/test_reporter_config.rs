//! Tests for reporter configuration: prefix mechanics, factory
//! resolution, and config file loading

use request_metrics::constants::config::REPORTER_PREFIX;
use request_metrics::{
    build, load_config, ConfigError, InMemoryReporter, MetricsConfig, ReporterRegistry,
};
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_with_options(entries: &[(&str, &str)]) -> MetricsConfig {
    let mut config = MetricsConfig::default();
    for (key, value) in entries {
        config.options.insert(key.to_string(), value.to_string());
    }
    config
}

#[test]
fn test_prefixed_keys_reach_reporter_stripped() {
    let mut config = config_with_options(&[
        (&format!("{}prop1", REPORTER_PREFIX), "val1"),
        (&format!("{}prop2", REPORTER_PREFIX), "val2"),
        (&format!("{}prop3", REPORTER_PREFIX), "override"),
        ("prop3", "original"),
        ("not.prefixed.config", "val3"),
    ]);
    config.reporters = vec!["capture".to_string()];

    let capture = InMemoryReporter::new();
    let mut registry = ReporterRegistry::with_builtins();
    let template = capture.clone();
    registry.register("capture", move || Box::new(template.clone()));

    build(&config, &registry).expect("capture reporter must build");

    let received = capture.options();
    assert_eq!(received.get("prop1").map(String::as_str), Some("val1"));
    assert_eq!(received.get("prop2").map(String::as_str), Some("val2"));
    // Prefixed entry wins inside the reporter's namespace
    assert_eq!(received.get("prop3").map(String::as_str), Some("override"));
    // Unprefixed keys are merged in as well
    assert_eq!(
        received.get("not.prefixed.config").map(String::as_str),
        Some("val3")
    );
    // No raw prefixed key leaks through
    assert!(!received.keys().any(|k| k.starts_with(REPORTER_PREFIX)));

    // The unprefixed original remains visible to the rest of the system
    assert_eq!(
        config.options.get("prop3").map(String::as_str),
        Some("original")
    );
}

#[test]
fn test_every_listed_reporter_is_configured() {
    let first = InMemoryReporter::new();
    let second = InMemoryReporter::new();

    let mut registry = ReporterRegistry::empty();
    let template = first.clone();
    registry.register("first", move || Box::new(template.clone()));
    let template = second.clone();
    registry.register("second", move || Box::new(template.clone()));

    let mut config = config_with_options(&[(&format!("{}key", REPORTER_PREFIX), "value")]);
    config.reporters = vec!["first".to_string(), "second".to_string()];

    let listener = build(&config, &registry).expect("both reporters must build");
    assert_eq!(listener.registry().reporter_count(), 2);
    assert_eq!(first.options().get("key").map(String::as_str), Some("value"));
    assert_eq!(second.options().get("key").map(String::as_str), Some("value"));
}

#[test]
fn test_unknown_identifier_fails_at_startup() {
    let config = MetricsConfig {
        reporters: vec!["definitely-not-registered".to_string()],
        ..Default::default()
    };
    match build(&config, &ReporterRegistry::with_builtins()) {
        Err(ConfigError::UnknownReporter(id)) => {
            assert_eq!(id, "definitely-not-registered");
        }
        other => panic!("expected UnknownReporter, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_empty_reporter_list_computes_without_exporting() {
    let listener = build(&MetricsConfig::default(), &ReporterRegistry::with_builtins())
        .expect("empty reporter list is valid");
    assert_eq!(listener.registry().reporter_count(), 0);
    // Sensors still work; there is just nowhere to push snapshots
    listener.on_event(
        request_metrics::RequestId::new(1),
        request_metrics::EventKind::Finished,
        &request_metrics::EventOutcome::new().with_status(200),
    );
    assert!(!listener.registry().snapshot().is_empty());
}

#[test]
fn test_load_config_from_file() -> anyhow::Result<()> {
    let toml = r#"
reporters = ["log"]
sample_window_secs = 10
num_buckets = 5

[tags]
service = "orders"

[options]
"metrics.reporter.endpoint" = "localhost:9999"
"#;
    let mut temp_file = NamedTempFile::new()?;
    write!(temp_file, "{}", toml)?;

    let config = load_config(temp_file.path().to_str().unwrap())?;
    assert_eq!(config.reporters, vec!["log".to_string()]);
    assert_eq!(config.sample_window_secs, 10);
    assert_eq!(config.num_buckets, 5);
    assert_eq!(config.tags.get("service").map(String::as_str), Some("orders"));
    assert_eq!(
        config.reporter_options().get("endpoint").map(String::as_str),
        Some("localhost:9999")
    );

    Ok(())
}

#[test]
fn test_load_config_nonexistent_file() {
    let result = load_config("/nonexistent/path/metrics.toml");
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to read config file"));
}

#[test]
fn test_load_config_invalid_toml() -> anyhow::Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    write!(temp_file, "invalid toml content [[[")?;

    let result = load_config(temp_file.path().to_str().unwrap());
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to parse config file"));

    Ok(())
}

#[test]
fn test_reporter_options_empty_without_options() {
    let config = MetricsConfig::default();
    assert_eq!(config.reporter_options(), BTreeMap::new());
}
