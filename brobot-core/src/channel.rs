//! Script evaluation with JSON marshalling across the page boundary.
//!
//! Every script the channel submits returns a JSON *envelope* rather than the
//! raw value:
//!
//! ```text
//! {"status":"value","value":<any JSON>}
//! {"status":"undefined"}
//! {"status":"threw","error":"<message>"}
//! ```
//!
//! Whether the page produced a value, produced nothing yet, or threw is read
//! from the envelope tag, never inferred from the value itself.

use crate::poll::{self, deadline_after, escalate, expired, PollConfig};
use crate::probe::Attempt;
use brobot_common::{Result, RobotError};
use brobot_drivers::SessionDriver;
use serde::Deserialize;
use serde_json::Value;
use std::thread::sleep;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Envelope {
    Value {
        #[serde(default)]
        value: Value,
    },
    Undefined,
    Threw {
        error: String,
    },
}

/// Decoded result of a single round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOutcome {
    Value(Value),
    Undefined,
    Threw(String),
}

impl From<Envelope> for ScriptOutcome {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Value { value } => ScriptOutcome::Value(value),
            Envelope::Undefined => ScriptOutcome::Undefined,
            Envelope::Threw { error } => ScriptOutcome::Threw(error),
        }
    }
}

const CATCH_CLAUSE: &str = r#"    } catch (ex) {
        return JSON.stringify({ status: 'threw', error: String(ex && ex.message ? ex.message : ex) });
    }
})();"#;

/// Drop trailing whitespace and statement terminators from an expression.
pub fn trim_expression(expression: &str) -> &str {
    expression.trim_end().trim_end_matches(';').trim_end()
}

/// Script returning the envelope for `expression`.
pub fn value_script(expression: &str) -> String {
    format!(
        r#"return (function () {{
    try {{
        var __brobotValue = (
{expression}
        );
        if (typeof __brobotValue === 'undefined') {{
            return JSON.stringify({{ status: 'undefined' }});
        }}
        return JSON.stringify({{ status: 'value', value: __brobotValue }});
{CATCH_CLAUSE}"#,
        expression = trim_expression(expression),
    )
}

/// Script that runs `statement` for its side effects and reports whether it
/// threw.
pub fn statement_script(statement: &str) -> String {
    format!(
        r#"return (function () {{
    try {{
        (function () {{
{statement}
        }})();
        return JSON.stringify({{ status: 'value', value: null }});
{CATCH_CLAUSE}"#
    )
}

fn decode(raw: Value, expression: &str) -> Result<ScriptOutcome> {
    let decode_error = |source: serde_json::Error| RobotError::Decode {
        expression: expression.to_string(),
        source,
    };
    let text: String = serde_json::from_value(raw).map_err(decode_error)?;
    let envelope: Envelope = serde_json::from_str(&text).map_err(decode_error)?;
    Ok(envelope.into())
}

/// Borrowing view over a session that speaks the envelope protocol.
pub struct ScriptChannel<'d, D> {
    driver: &'d D,
}

impl<'d, D: SessionDriver> ScriptChannel<'d, D> {
    pub fn new(driver: &'d D) -> Self {
        Self { driver }
    }

    fn submit(&self, script: String, expression: &str) -> Result<ScriptOutcome> {
        let raw = self
            .driver
            .evaluate_script(&script)
            .map_err(|source| escalate(RobotError::Evaluation { script, source }))?;
        decode(raw, expression)
    }

    /// One round trip for `expression`, no retry.
    pub fn evaluate(&self, expression: &str) -> Result<ScriptOutcome> {
        self.submit(value_script(expression), expression)
    }

    /// Current value of `expression`; `undefined` decodes to `null`.
    ///
    /// Driver failures come back as [`RobotError::Evaluation`] carrying the
    /// submitted script, in-page exceptions as [`RobotError::Script`].
    pub fn read_value(&self, expression: &str) -> Result<Value> {
        match self.evaluate(expression)? {
            ScriptOutcome::Value(value) => Ok(value),
            ScriptOutcome::Undefined => Ok(Value::Null),
            ScriptOutcome::Threw(message) => Err(RobotError::Script {
                message,
                expression: expression.to_string(),
            }),
        }
    }

    /// One attempt as seen by the poll engine: `undefined` is not ready yet,
    /// errors are failures to hold.
    pub fn attempt_value(&self, expression: &str) -> Attempt<Value> {
        match self.evaluate(expression) {
            Ok(ScriptOutcome::Value(value)) => Attempt::Ready(value),
            Ok(ScriptOutcome::Undefined) => Attempt::NotReady,
            Ok(ScriptOutcome::Threw(message)) => Attempt::Failed(RobotError::Script {
                message,
                expression: expression.to_string(),
            }),
            Err(err) => Attempt::Failed(err),
        }
    }

    /// Wait for `expression` to evaluate to anything other than `undefined`
    /// and return it, `false`, `0`, `""` and `null` included.
    pub fn read_value_with_retry(&self, expression: &str, config: &PollConfig) -> Result<Value> {
        let expression = trim_expression(expression);
        poll::wait_for_change(config, &format!("value: {expression}"), || {
            self.attempt_value(expression)
        })
    }

    /// Run `statement` until it completes without throwing.
    ///
    /// In-page exceptions are retried until the deadline; driver failures
    /// are returned immediately.
    pub fn run_script(&self, statement: &str, config: &PollConfig) -> Result<bool> {
        let script = statement_script(statement);
        let deadline = deadline_after(Instant::now(), config.timeout);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let last_error = match self.submit(script.clone(), statement)? {
                ScriptOutcome::Threw(message) => message,
                ScriptOutcome::Value(_) | ScriptOutcome::Undefined => {
                    debug!(target: "brobot.channel", attempts, "script completed");
                    return Ok(true);
                }
            };
            debug!(target: "brobot.channel", attempts, error = %last_error, "script threw; retrying");

            sleep(config.poll_interval);
            if expired(deadline) {
                warn!(target: "brobot.channel", attempts, error = %last_error, "script never completed");
                return Err(RobotError::Timeout {
                    condition: format!("javascript: {statement} (last error: {last_error})"),
                    timeout: config.timeout,
                });
            }
        }
    }
}
