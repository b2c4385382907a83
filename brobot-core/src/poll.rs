//! Timed retry loops underneath every wait, click and read.
//!
//! Both loops compute a single deadline before the first attempt, invoke the
//! probe strictly sequentially, and sleep a fixed interval between attempts
//! (never after a successful one). Errors raised by an attempt are held as the
//! root cause instead of surfacing; when the deadline passes the most recent
//! held error is returned unchanged, otherwise a [`RobotError::Timeout`].
//!
//! Two kinds of failure end the loop early: crash signals reported by the
//! browser (converted to [`RobotError::FatalSession`]) and errors that are not
//! retryable at all (see [`RobotError::is_retryable`]).

use crate::probe::{Attempt, Truthy};
use brobot_common::{Result, RobotError, RobotSettings};
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Messages (lower-cased) that mean the browser session is gone for good.
const CRASH_SIGNALS: &[&str] = &[
    "session deleted because of page crash",
    "tab crashed",
    "chrome not reachable",
];

/// Deadline and interval for one wait call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl PollConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Use `timeout` when given, otherwise the robot's execution timeout.
    pub fn from_settings(settings: &RobotSettings, timeout: Option<Duration>) -> Self {
        Self::new(
            timeout.unwrap_or(settings.execution_timeout),
            settings.poll_interval,
        )
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from_settings(&RobotSettings::default(), None)
    }
}

/// How a poll loop ended.
#[derive(Debug)]
pub enum PollOutcome<T> {
    Success(T),
    /// The deadline passed. Holds the error of the last attempt, if it failed.
    TimedOut(Option<RobotError>),
    /// A crash signal or non-retryable error stopped the loop early.
    Fatal(RobotError),
}

impl<T> PollOutcome<T> {
    /// Collapse into the public error contract.
    pub fn into_result(self, condition: &str, timeout: Duration) -> Result<T> {
        match self {
            PollOutcome::Success(value) => Ok(value),
            PollOutcome::TimedOut(Some(root_cause)) => Err(root_cause),
            PollOutcome::TimedOut(None) => Err(RobotError::Timeout {
                condition: condition.to_string(),
                timeout,
            }),
            PollOutcome::Fatal(err) => Err(err),
        }
    }
}

/// The part of an error reported by the browser itself. Exceptions thrown by
/// page scripts and errors raised on our side carry none.
fn browser_message(err: &RobotError) -> Option<String> {
    match err {
        RobotError::Evaluation { source, .. } | RobotError::Driver(source) => {
            Some(format!("{source:#}"))
        }
        _ => None,
    }
}

pub fn is_crash_signal(message: &str) -> bool {
    let lowered = message.to_lowercase();
    CRASH_SIGNALS.iter().any(|signal| lowered.contains(signal))
}

/// Turn errors carrying a crash signal into [`RobotError::FatalSession`].
pub(crate) fn escalate(err: RobotError) -> RobotError {
    if matches!(err, RobotError::FatalSession(_)) {
        return err;
    }
    match browser_message(&err) {
        Some(message) if is_crash_signal(&message) => RobotError::FatalSession(message),
        _ => err,
    }
}

/// Deadline `timeout` from `start`, or `None` when it lies beyond what
/// [`Instant`] can represent.
pub(crate) fn deadline_after(start: Instant, timeout: Duration) -> Option<Instant> {
    start.checked_add(timeout)
}

pub(crate) fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// Core loop shared by [`wait_for`] and [`wait_for_change`].
///
/// `attempt` is invoked until it reports `Ready`, the deadline passes, or it
/// fails with an error that must not be retried.
pub fn poll<T, F>(config: &PollConfig, description: &str, mut attempt: F) -> PollOutcome<T>
where
    F: FnMut() -> Attempt<T>,
{
    let started = Instant::now();
    let deadline = deadline_after(started, config.timeout);
    let mut attempts: u32 = 0;
    let mut last_failure: Option<RobotError>;

    loop {
        attempts += 1;
        match attempt() {
            Attempt::Ready(value) => {
                debug!(
                    target: "brobot.poll",
                    %description,
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "condition satisfied"
                );
                return PollOutcome::Success(value);
            }
            Attempt::NotReady => last_failure = None,
            Attempt::Failed(err) => {
                let err = escalate(err);
                if !err.is_retryable() {
                    error!(
                        target: "brobot.poll",
                        %description,
                        attempts,
                        error = %err,
                        "aborting wait"
                    );
                    return PollOutcome::Fatal(err);
                }
                debug!(target: "brobot.poll", %description, attempts, error = %err, "attempt failed");
                last_failure = Some(err);
            }
        }

        sleep(config.poll_interval);
        if expired(deadline) {
            warn!(
                target: "brobot.poll",
                %description,
                attempts,
                timeout_ms = config.timeout.as_millis() as u64,
                root_cause = last_failure.is_some(),
                "wait timed out"
            );
            return PollOutcome::TimedOut(last_failure);
        }
    }
}

/// Wait until the probe yields a truthy value and return it.
pub fn wait_for<T, F>(config: &PollConfig, description: &str, mut attempt: F) -> Result<T>
where
    T: Truthy,
    F: FnMut() -> Attempt<T>,
{
    poll(config, description, || match attempt() {
        Attempt::Ready(value) if value.is_truthy() => Attempt::Ready(value),
        Attempt::Ready(_) | Attempt::NotReady => Attempt::NotReady,
        Attempt::Failed(err) => Attempt::Failed(err),
    })
    .into_result(description, config.timeout)
}

/// Wait until the probe yields any value at all, falsy ones included.
pub fn wait_for_change<T, F>(config: &PollConfig, description: &str, attempt: F) -> Result<T>
where
    F: FnMut() -> Attempt<T>,
{
    poll(config, description, attempt).into_result(description, config.timeout)
}
