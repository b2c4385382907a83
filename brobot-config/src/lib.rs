//! Loader for robot configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are attached; `BROBOT__`-prefixed
//! environment variables (e.g. `BROBOT__ROBOT__POLL_INTERVAL_MS=100`) are
//! applied last. String values may reference `${VAR}` placeholders, which are
//! expanded after merging. Every field has a default, so an empty document is
//! a valid configuration.
use brobot_common::observability::{self, LogConfig};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub use brobot_common::observability::LogFormat;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct BrobotConfig {
    #[serde(default, deserialize_with = "version_string")]
    pub version: Option<String>,
    #[serde(default)]
    pub robot: RobotSection,
    #[serde(default)]
    pub webdriver: WebDriverSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Timing knobs applied to every robot built from this configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RobotSection {
    #[serde(default = "default_execution_timeout_secs")]
    pub execution_timeout_secs: f64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for RobotSection {
    fn default() -> Self {
        Self {
            execution_timeout_secs: default_execution_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl RobotSection {
    /// Values [`BrobotConfig::validate`] would reject fall back to the
    /// default timeout.
    pub fn execution_timeout(&self) -> Duration {
        match Duration::try_from_secs_f64(self.execution_timeout_secs) {
            Ok(timeout) if !timeout.is_zero() => timeout,
            _ => Duration::from_secs_f64(default_execution_timeout_secs()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

/// Where the WebDriver service lives and how the browser is launched.
#[derive(Debug, Clone, Deserialize)]
pub struct WebDriverSection {
    #[serde(default = "default_webdriver_url")]
    pub url: String,
    #[serde(default)]
    pub browser: BrowserKind,
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Extra command-line arguments handed to the browser.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for WebDriverSection {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
            browser: BrowserKind::default(),
            headless: default_headless(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub emit_stderr: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            log_dir: None,
            format: LogFormat::default(),
            emit_stderr: false,
            filter: default_filter(),
        }
    }
}

impl LoggingSection {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            app_name: self.app_name.clone(),
            log_dir: self.log_dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }

    /// Install the global tracing subscriber described by this section.
    /// Returns the active log file.
    pub fn init_logging(&self) -> anyhow::Result<PathBuf> {
        observability::init_logging(self.log_config())
    }
}

/// `version: 1` and `version: 0.1` read as strings too.
fn version_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn default_execution_timeout_secs() -> f64 {
    30.0
}
fn default_poll_interval_ms() -> u64 {
    250
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_headless() -> bool {
    true
}
fn default_app_name() -> String {
    "brobot".into()
}
fn default_filter() -> String {
    "info".into()
}

impl BrobotConfig {
    /// Reject values the robot cannot run with.
    ///
    /// ```
    /// use brobot_config::BrobotConfigLoader;
    ///
    /// let err = BrobotConfigLoader::new()
    ///     .with_yaml_str("robot:\n  poll_interval_ms: 0")
    ///     .load()
    ///     .unwrap_err();
    /// assert!(err.to_string().contains("poll_interval_ms"));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.robot.execution_timeout_secs;
        match Duration::try_from_secs_f64(timeout) {
            Ok(duration) if !duration.is_zero() => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "robot.execution_timeout_secs must be a positive number of seconds \
                     that fits a duration, got {timeout}"
                )));
            }
        }
        if self.robot.poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "robot.poll_interval_ms must be greater than zero".into(),
            ));
        }
        Url::parse(&self.webdriver.url).map_err(|e| {
            ConfigError::Message(format!("webdriver.url {:?} is invalid: {e}", self.webdriver.url))
        })?;
        Ok(())
    }
}

/// Conventional per-user location of `brobot.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("brobot").join("brobot.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct BrobotConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for BrobotConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl BrobotConfigLoader {
    /// Start with defaults plus `BROBOT__` environment overrides.
    ///
    /// ```
    /// use brobot_config::BrobotConfigLoader;
    ///
    /// let config = BrobotConfigLoader::new().load().expect("defaults are valid");
    /// assert_eq!(config.robot.poll_interval_ms, 250);
    /// assert_eq!(config.webdriver.url, "http://localhost:9515");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred
    /// from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing, so runs can rely
    /// purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use brobot_config::{BrobotConfigLoader, BrowserKind};
    ///
    /// let cfg = BrobotConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "test"
    /// robot:
    ///   execution_timeout_secs: 5
    /// webdriver:
    ///   browser: firefox
    ///   url: "http://localhost:4444"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.version.as_deref(), Some("test"));
    /// assert_eq!(cfg.robot.execution_timeout().as_secs(), 5);
    /// assert_eq!(cfg.webdriver.browser, BrowserKind::Firefox);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder, expand `${VAR}` placeholders and deserialize the
    /// merged sources into a validated [`BrobotConfig`].
    pub fn load(self) -> Result<BrobotConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("BROBOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: BrobotConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}
