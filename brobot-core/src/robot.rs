use crate::channel::ScriptChannel;
use crate::escape::{quote, xpath_literal};
use crate::poll::{self, PollConfig};
use crate::probe::{Attempt, Probe};
use brobot_common::{Result, RobotError, RobotSettings};
use brobot_config::RobotSection;
use brobot_drivers::{DomElement, Locator, SessionDriver};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Global registry the application under test publishes named values into.
pub const TEST_VARIABLES_GLOBAL: &str = "window.ZAN_BROWSERTEST_VARIABLES";

/// Drives one browser session on behalf of a test.
///
/// Every wait uses the robot's execution timeout unless the caller passes
/// its own, and sleeps the robot's poll interval between attempts.
pub struct BrowserRobot<D: SessionDriver> {
    id: String,
    session: D,
    settings: RobotSettings,
}

impl<D: SessionDriver> BrowserRobot<D> {
    pub fn new(session: D) -> Self {
        Self::with_settings(session, RobotSettings::default())
    }

    pub fn with_settings(session: D, settings: RobotSettings) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session,
            settings,
        }
    }

    pub fn from_config(session: D, section: &RobotSection) -> Self {
        Self::with_settings(
            session,
            RobotSettings {
                execution_timeout: section.execution_timeout(),
                poll_interval: section.poll_interval(),
            },
        )
    }

    /// Unique id of this robot.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session(&self) -> &D {
        &self.session
    }

    pub fn settings(&self) -> RobotSettings {
        self.settings
    }

    pub fn execution_timeout(&self) -> Duration {
        self.settings.execution_timeout
    }

    pub fn set_execution_timeout(&mut self, timeout: Duration) {
        self.settings.execution_timeout = timeout;
    }

    pub fn poll_interval(&self) -> Duration {
        self.settings.poll_interval
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.settings.poll_interval = interval;
    }

    pub fn set_up(&mut self) -> Result<()> {
        self.session.start()?;
        info!(target: "brobot.robot", robot_id = %self.id, "session started");
        Ok(())
    }

    pub fn tear_down(&mut self) -> Result<()> {
        self.session.stop()?;
        info!(target: "brobot.robot", robot_id = %self.id, "session stopped");
        Ok(())
    }

    pub fn navigate(&self, url: &str) -> Result<()> {
        self.session.navigate(url)?;
        Ok(())
    }

    fn poll_config(&self, timeout: Option<Duration>) -> PollConfig {
        PollConfig::from_settings(&self.settings, timeout)
    }

    pub fn channel(&self) -> ScriptChannel<'_, D> {
        ScriptChannel::new(&self.session)
    }

    // ==============================
    // Script Value Channel
    // ==============================

    /// Raw pass-through to the driver; no envelope, no retry.
    pub fn evaluate_script(&self, script: &str) -> Result<Value> {
        Ok(self.session.evaluate_script(script)?)
    }

    /// Current value of `expression` in the top-level window.
    ///
    /// Prefer [`BrowserRobot::read_value_with_retry`] in tests; this reads
    /// exactly once.
    pub fn read_value(&self, expression: &str) -> Result<Value> {
        self.channel().read_value(expression)
    }

    /// Wait for `expression` to evaluate to something other than `undefined`
    /// and return it.
    pub fn read_value_with_retry(&self, expression: &str, timeout: Option<Duration>) -> Result<Value> {
        self.channel()
            .read_value_with_retry(expression, &self.poll_config(timeout))
    }

    /// Run `statement` until it executes without throwing.
    pub fn run_script(&self, statement: &str, timeout: Option<Duration>) -> Result<bool> {
        self.channel().run_script(statement, &self.poll_config(timeout))
    }

    // ==============================
    // Poll Engine
    // ==============================

    /// Wait until `probe` yields a truthy value and return it.
    pub fn wait_for(&self, probe: Probe<'_>, timeout: Option<Duration>) -> Result<Value> {
        let config = self.poll_config(timeout);
        match probe {
            Probe::Script(expression) => {
                let channel = self.channel();
                poll::wait_for(&config, &format!("true: {expression}"), || {
                    channel.attempt_value(&expression)
                })
            }
            Probe::Function {
                description,
                mut check,
            } => poll::wait_for(&config, &description, || check()),
        }
    }

    /// Wait until `probe` yields any value, falsy ones included.
    pub fn wait_for_change(&self, probe: Probe<'_>, timeout: Option<Duration>) -> Result<Value> {
        let config = self.poll_config(timeout);
        match probe {
            Probe::Script(expression) => {
                let channel = self.channel();
                poll::wait_for_change(&config, &format!("value: {expression}"), || {
                    channel.attempt_value(&expression)
                })
            }
            Probe::Function {
                description,
                mut check,
            } => poll::wait_for_change(&config, &description, || check()),
        }
    }

    /// Wait for `expression` to evaluate to a truthy value.
    pub fn wait_for_true(&self, expression: &str, timeout: Option<Duration>) -> Result<Value> {
        self.wait_for(Probe::script(expression), timeout)
    }

    // ==============================
    // Action helpers
    // ==============================

    /// Click the single element whose text is exactly `text`, optionally
    /// searching only below the first element matching the CSS selector
    /// `within`.
    ///
    /// Keeps polling while nothing matches; more than one match is an
    /// immediate [`RobotError::AmbiguousMatch`].
    pub fn click(&self, text: &str, within: Option<&str>) -> Result<()> {
        let description = match within {
            Some(selector) => format!("element with text {text:?} inside `{selector}`"),
            None => format!("element with text {text:?}"),
        };
        self.wait_for(
            Probe::function(description, || self.click_unique(text, within)),
            None,
        )?;
        Ok(())
    }

    fn click_unique(&self, text: &str, within: Option<&str>) -> Result<bool> {
        let literal = xpath_literal(text);
        let matches = match within {
            Some(selector) => match self.session.find_element(&Locator::css(selector))? {
                Some(scope) => scope.find_all(&Locator::xpath(format!(".//*[text()={literal}]")))?,
                None => return Ok(false),
            },
            None => self
                .session
                .find_all(&Locator::xpath(format!("//*[text()={literal}]")))?,
        };

        match matches.as_slice() {
            [] => Ok(false),
            [element] => {
                element.click()?;
                debug!(target: "brobot.robot", %text, "clicked element");
                Ok(true)
            }
            many => Err(RobotError::AmbiguousMatch {
                text: text.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Wait until the element matching `within` (or the page body) contains
    /// `text`.
    pub fn wait_for_text(&self, text: &str, within: Option<&str>, timeout: Option<Duration>) -> Result<()> {
        let selector = within.unwrap_or("body");
        let locator = Locator::css(selector);
        self.wait_for(
            Probe::function(format!("text {text:?} in `{selector}`"), || -> Result<bool> {
                match self.session.find_element(&locator)? {
                    Some(scope) => Ok(scope.has_content(text)?),
                    None => Ok(false),
                }
            }),
            timeout,
        )?;
        Ok(())
    }

    /// Value the page published under `name` in
    /// [`TEST_VARIABLES_GLOBAL`]. Empty values count as not yet set.
    pub fn get_test_variable(&self, name: &str) -> Result<Value> {
        let expression = format!("({TEST_VARIABLES_GLOBAL} || {{}})[{}]", quote(name));
        let channel = self.channel();
        self.wait_for(
            Probe::function(format!("test variable {name:?}"), || {
                channel.attempt_value(&expression)
            }),
            None,
        )
    }

    /// Run a closure probe that reports readiness with an [`Attempt`].
    pub fn wait_for_function<F>(&self, description: &str, check: F, timeout: Option<Duration>) -> Result<Value>
    where
        F: FnMut() -> Attempt<Value>,
    {
        self.wait_for(Probe::function(description, check), timeout)
    }
}
