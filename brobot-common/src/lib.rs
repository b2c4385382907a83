//! Common types shared across brobot crates.
//!
//! This crate defines the robot's timing settings, the error taxonomy every
//! wait/click/read operation reports through, and the tracing initialisation
//! used by test binaries. It is intentionally lightweight so the driver and
//! core crates can both depend on it.
//!
//! # Overview
//!
//! - [`RobotSettings`]: execution timeout and poll interval owned by a robot
//! - [`RobotError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use brobot_common::RobotSettings;
//! use std::time::Duration;
//!
//! let settings = RobotSettings::default();
//! assert_eq!(settings.execution_timeout, Duration::from_secs(30));
//! assert_eq!(settings.poll_interval, Duration::from_millis(250));
//! ```
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod observability;

/// How long a script-backed wait may run before it is considered failed.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between two probe attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Timing knobs that live for the lifetime of a robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotSettings {
    /// Default deadline for every wait when the caller passes no timeout.
    pub execution_timeout: Duration,
    /// Fixed sleep between probe attempts.
    pub poll_interval: Duration,
}

impl Default for RobotSettings {
    fn default() -> Self {
        Self {
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Error types reported by the robot and its collaborators.
#[derive(thiserror::Error, Debug)]
pub enum RobotError {
    /// A wait ran out of time without capturing a root-cause error.
    #[error("timed out after {timeout:?} waiting for {condition}")]
    Timeout { condition: String, timeout: Duration },

    /// The browser reported that the session died (e.g. a renderer crash).
    #[error("browser session crashed: {0}")]
    FatalSession(String),

    /// An exact-text lookup matched more than one element.
    #[error("text \"{text}\" matched {count} elements")]
    AmbiguousMatch { text: String, count: usize },

    /// A structural precondition failed outright.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The evaluated script threw inside the page.
    #[error("{message}\n\nwhile evaluating:\n------------------------------------\n{expression}\n------------------------------------\n")]
    Script { message: String, expression: String },

    /// The driver failed while submitting a script.
    #[error("{source:#}\n\nwhile evaluating:\n------------------------------------\n{script}\n------------------------------------\n")]
    Evaluation {
        script: String,
        #[source]
        source: anyhow::Error,
    },

    /// The page answered with something that is not a result envelope.
    #[error("could not decode result of `{expression}`: {source}")]
    Decode {
        expression: String,
        #[source]
        source: serde_json::Error,
    },

    /// A driver (session, lookup, click) reported an error.
    #[error("driver error: {0:#}")]
    Driver(#[from] anyhow::Error),

    /// A test assertion evaluated in the page did not hold.
    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RobotError {
    /// Whether a poll loop may hold this error and keep trying.
    ///
    /// Ambiguity, invalid arguments, crashes and bad configuration will not
    /// resolve by waiting longer.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            RobotError::FatalSession(_)
                | RobotError::AmbiguousMatch { .. }
                | RobotError::InvalidArgument(_)
                | RobotError::Config(_)
        )
    }
}

/// Convenient alias for results that use [`RobotError`].
pub type Result<T> = std::result::Result<T, RobotError>;
