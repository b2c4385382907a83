//! Browser test robot.
//!
//! [`BrowserRobot`] turns test intent ("click the element with this text",
//! "wait until this script returns true") into repeated script evaluations
//! and DOM lookups against a live [`SessionDriver`], tolerating the delays of
//! asynchronously rendered pages.
//!
//! Every wait goes through the poll engine in [`poll`]: one deadline, a fixed
//! interval between attempts, errors held as the root cause until the deadline,
//! and an early abort when the browser reports that the session crashed.
//!
//! ```no_run
//! use brobot_config::BrobotConfigLoader;
//! use brobot_core::BrowserRobot;
//! use brobot_drivers::WebDriverSession;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = BrobotConfigLoader::new().load()?;
//! config.logging.init_logging()?;
//! let session = WebDriverSession::from_config(&config)?;
//! let mut robot = BrowserRobot::from_config(session, &config.robot);
//!
//! robot.set_up()?;
//! robot.navigate("http://localhost:8080/app/")?;
//! robot.wait_for_true("window.Ext && Ext.isReady", None)?;
//! robot.click("Save", Some(".x-toolbar"))?;
//! robot.tear_down()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`SessionDriver`]: brobot_drivers::SessionDriver

pub mod channel;
pub mod escape;
pub mod extjs;
pub mod poll;
pub mod probe;
pub mod robot;

pub use brobot_common::{Result, RobotError, RobotSettings};
pub use channel::{ScriptChannel, ScriptOutcome};
pub use extjs::{ExtJsRobot, MESSAGE_BOX_SELECTOR, VALUE_LIKE_FN};
pub use poll::{PollConfig, PollOutcome};
pub use probe::{Attempt, Probe, Truthy};
pub use robot::{BrowserRobot, TEST_VARIABLES_GLOBAL};
