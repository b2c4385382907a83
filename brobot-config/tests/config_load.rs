use brobot_config::{BrobotConfigLoader, BrowserKind, LogFormat};
use serial_test::serial;
use std::{fs, path::PathBuf, time::Duration};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
version: 0.1
robot:
  execution_timeout_secs: 12.5
  poll_interval_ms: 100
webdriver:
  url: "http://${GRID_HOST}:4444"
  browser: firefox
  headless: false
  args: ["-private"]
logging:
  format: json
  emit_stderr: true
  "#;
    let p = write_yaml(&tmp, "brobot.yaml", file_yaml);

    let config = temp_env::with_var("GRID_HOST", Some("selenium"), || {
        BrobotConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load robot config")
    });

    assert_eq!(config.version.as_deref(), Some("0.1"));
    assert_eq!(config.robot.execution_timeout(), Duration::from_millis(12_500));
    assert_eq!(config.robot.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.webdriver.url, "http://selenium:4444");
    assert_eq!(config.webdriver.browser, BrowserKind::Firefox);
    assert!(!config.webdriver.headless);
    assert_eq!(config.webdriver.args, vec!["-private".to_string()]);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.logging.emit_stderr);
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "brobot.yaml", "robot:\n  poll_interval_ms: 100\n");

    let config = temp_env::with_var("BROBOT__ROBOT__POLL_INTERVAL_MS", Some("40"), || {
        BrobotConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load robot config")
    });

    assert_eq!(config.robot.poll_interval_ms, 40);
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = BrobotConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults load");

    assert_eq!(config.robot.execution_timeout(), Duration::from_secs(30));
    assert_eq!(config.webdriver.browser, BrowserKind::Chrome);
    assert!(config.webdriver.headless);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = BrobotConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();

    assert!(result.is_err());
}

#[test]
#[serial]
fn quoted_and_integer_versions_are_strings() {
    let quoted = BrobotConfigLoader::new()
        .with_yaml_str("version: \"2024.1\"")
        .load()
        .expect("quoted version");
    assert_eq!(quoted.version.as_deref(), Some("2024.1"));

    let integer = BrobotConfigLoader::new()
        .with_yaml_str("version: 2")
        .load()
        .expect("integer version");
    assert_eq!(integer.version.as_deref(), Some("2"));
}

#[test]
#[serial]
fn oversized_timeout_is_rejected_at_load() {
    let err = BrobotConfigLoader::new()
        .with_yaml_str("robot:\n  execution_timeout_secs: 1.0e20\n")
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("execution_timeout_secs"), "{err}");
}
